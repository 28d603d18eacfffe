use crate::presentation::auth::{me, refresh_token, register, token, update_me};
use crate::presentation::handlers::{
    create_ingredient, create_recipe, create_tag, delete_ingredient, delete_recipe, delete_tag,
    get_recipe, health_check, list_ingredients, list_recipes, list_tags, patch_recipe, put_recipe,
    update_ingredient, update_tag, upload_recipe_image,
};
use actix_web::web;

/// Registers the full route table. Shared between `main` and the test
/// harness so both serve the identical surface.
///
/// Within the `/recipe` scope the literal `tags`/`ingredients` resources are
/// registered before the `{id}` resource; registration order is match order.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/user")
                    .route("/create", web::post().to(register))
                    .route("/token", web::post().to(token))
                    .route("/token/refresh", web::post().to(refresh_token))
                    .route("/me", web::get().to(me))
                    .route("/me", web::put().to(update_me))
                    .route("/me", web::patch().to(update_me)),
            )
            .service(
                web::scope("/recipe")
                    .route("/tags", web::get().to(list_tags))
                    .route("/tags", web::post().to(create_tag))
                    .route("/tags/{id}", web::patch().to(update_tag))
                    .route("/tags/{id}", web::delete().to(delete_tag))
                    .route("/ingredients", web::get().to(list_ingredients))
                    .route("/ingredients", web::post().to(create_ingredient))
                    .route("/ingredients/{id}", web::patch().to(update_ingredient))
                    .route("/ingredients/{id}", web::delete().to(delete_ingredient))
                    .route("", web::get().to(list_recipes))
                    .route("", web::post().to(create_recipe))
                    .route("/{id}", web::get().to(get_recipe))
                    .route("/{id}", web::put().to(put_recipe))
                    .route("/{id}", web::patch().to(patch_recipe))
                    .route("/{id}", web::delete().to(delete_recipe))
                    .route("/{id}/image", web::post().to(upload_recipe_image)),
            ),
    );
}
