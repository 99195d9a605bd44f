use paperclip::actix::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api/v1").service(
                web::scope("/book")
                    .service(
                        web::resource("")
                            .route(web::get().to(handlers::list_books))
                            .route(web::post().to(handlers::add_book)),
                    )
                    // Field routes are registered ahead of the catch-all id routes.
                    .service(
                        web::resource("/title/{book_id}")
                            .route(web::put().to(handlers::update_book_title)),
                    )
                    .service(
                        web::resource("/author/{book_id}")
                            .route(web::put().to(handlers::update_book_author)),
                    )
                    .service(
                        web::resource("/price/{book_id}")
                            .route(web::put().to(handlers::update_book_price)),
                    )
                    .service(
                        web::resource("/summary/{book_id}")
                            .route(web::put().to(handlers::update_book_summary)),
                    )
                    .service(
                        web::resource("/cover_type/{book_id}")
                            .route(web::put().to(handlers::update_book_cover_type)),
                    )
                    .service(
                        web::resource("/genre/{book_id}")
                            .route(web::put().to(handlers::update_book_genre)),
                    )
                    .service(
                        web::resource("/quantity/{book_id}")
                            .route(web::put().to(handlers::update_book_quantity)),
                    )
                    .service(
                        web::resource("/category/{book_id}")
                            .route(web::put().to(handlers::update_book_category)),
                    )
                    .service(
                        web::resource("/cover_id/{book_id}")
                            .route(web::put().to(handlers::update_book_cover_id)),
                    )
                    .service(
                        web::resource("/{book_id}")
                            .route(web::get().to(handlers::get_book))
                            .route(web::put().to(handlers::update_book))
                            .route(web::delete().to(handlers::delete_book)),
                    ),
            ),
        );
}
