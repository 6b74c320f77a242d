use crate::{api::attendance, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
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

    let clock_limiter = Arc::new(build_limiter(config.rate_clock_per_min));
    let read_limiter = Arc::new(build_limiter(config.rate_read_per_min));

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/attendance")
                // /attendance
                .service(
                    web::resource("")
                        .wrap(read_limiter.clone())
                        .route(web::get().to(attendance::attendance_list)),
                )
                // /attendance/status
                .service(
                    web::resource("/status")
                        .wrap(read_limiter)
                        .route(web::get().to(attendance::status)),
                )
                // clock actions, one route per transition
                .service(
                    web::resource("/check-in")
                        .wrap(clock_limiter.clone())
                        .route(web::post().to(attendance::check_in)),
                )
                .service(
                    web::resource("/break-start")
                        .wrap(clock_limiter.clone())
                        .route(web::post().to(attendance::break_start)),
                )
                .service(
                    web::resource("/break-end")
                        .wrap(clock_limiter.clone())
                        .route(web::post().to(attendance::break_end)),
                )
                .service(
                    web::resource("/check-out")
                        .wrap(clock_limiter)
                        .route(web::post().to(attendance::check_out)),
                ),
        ),
    );
}
