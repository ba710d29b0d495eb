use crate::{
    api::{dashboard, ledger, time_off_request, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/time-off")
                    // /time-off
                    .service(
                        web::resource("")
                            .route(web::get().to(time_off_request::list_requests))
                            .route(web::post().to(time_off_request::create_request)),
                    )
                    // /time-off/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(time_off_request::get_request))
                            .route(web::put().to(time_off_request::update_request)),
                    )
                    // /time-off/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(time_off_request::approve_request)),
                    )
                    // /time-off/{id}/deny
                    .service(
                        web::resource("/{id}/deny")
                            .route(web::put().to(time_off_request::deny_request)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    // /dashboard/manager
                    .service(
                        web::resource("/manager")
                            .route(web::get().to(dashboard::manager_dashboard)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(web::resource("").route(web::get().to(user::list_users)))
                    // /users/{id}
                    .service(web::resource("/{id}").route(web::get().to(user::get_user)))
                    // /users/{id}/manager
                    .service(
                        web::resource("/{id}/manager")
                            .route(web::put().to(user::assign_manager)),
                    ),
            )
            .service(
                web::scope("/ledger")
                    // /ledger/balance
                    .service(web::resource("/balance").route(web::get().to(ledger::get_balance)))
                    // /ledger/entries
                    .service(web::resource("/entries").route(web::get().to(ledger::list_entries)))
                    // /ledger/accruals
                    .service(web::resource("/accruals").route(web::post().to(ledger::run_accrual))),
            ),
    );
}
