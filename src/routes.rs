use crate::{
    api::{attendance, leave_draft, leave_request},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP rate limiters shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    protected: Arc<Limiter>,
    submit: Arc<Limiter>,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
            submit: Arc::new(build_limiter(config.rate_submit_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(limiters.protected.clone())
            .service(
                web::scope("/leave")
                    // fixed paths first so they never reach /leave/{id}
                    .service(
                        web::resource("/categories")
                            .route(web::get().to(leave_request::list_categories)),
                    )
                    .service(
                        web::resource("/balances").route(web::get().to(leave_request::list_balances)),
                    )
                    .service(
                        web::resource("/summary").route(web::get().to(leave_request::leave_summary)),
                    )
                    // /leave/drafts
                    .service(
                        web::resource("/drafts").route(web::post().to(leave_draft::open_draft)),
                    )
                    .service(
                        web::resource("/drafts/{id}")
                            .route(web::get().to(leave_draft::get_draft))
                            .route(web::patch().to(leave_draft::edit_draft))
                            .route(web::delete().to(leave_draft::cancel_draft)),
                    )
                    .service(
                        web::resource("/drafts/{id}/dropdown")
                            .route(web::put().to(leave_draft::toggle_dropdown)),
                    )
                    .service(
                        web::resource("/drafts/{id}/refresh")
                            .route(web::post().to(leave_draft::refresh_draft)),
                    )
                    .service(
                        web::resource("/drafts/{id}/validate")
                            .route(web::post().to(leave_draft::validate_draft)),
                    )
                    .service(
                        web::resource("/drafts/{id}/submit")
                            .wrap(limiters.submit.clone())
                            .route(web::post().to(leave_draft::submit_draft)),
                    )
                    // /leave
                    .service(web::resource("").route(web::get().to(leave_request::leave_list)))
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("").route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(
                        web::resource("/summary")
                            .route(web::get().to(attendance::attendance_summary)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_still_builds() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(1000).is_ok());
    }
}
