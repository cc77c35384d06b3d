use crate::{
    api::{attendance, class, dashboard, employee, roster, scan, settings, student},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let scan_limiter = build_limiter(config.rate_scan_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // The scan endpoint stays public: scanning stations are unattended
    // kiosks, rate-limited instead of authenticated.
    cfg.service(
        web::scope("/scan").service(
            web::resource("/submit")
                .wrap(Governor::new(&scan_limiter))
                .route(web::post().to(scan::submit_scan)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/students")
                            .route(web::get().to(attendance::student_day_view)),
                    )
                    .service(
                        web::resource("/students/{student_no}/status")
                            .route(web::post().to(attendance::override_student_day)),
                    )
                    .service(
                        web::resource("/employees")
                            .route(web::get().to(attendance::employee_day_view)),
                    )
                    .service(
                        web::resource("/employees/{code}/status")
                            .route(web::post().to(attendance::override_employee_day)),
                    ),
            )
            .service(
                web::scope("/roster")
                    .service(web::resource("").route(web::get().to(roster::month_view)))
                    .service(web::resource("/save").route(web::post().to(roster::save_roster)))
                    .service(
                        web::resource("/copy-previous")
                            .route(web::post().to(roster::copy_previous)),
                    ),
            )
            .service(
                web::scope("/settings")
                    .service(web::resource("/windows").route(web::get().to(settings::get_windows)))
                    .service(
                        web::resource("/windows/student")
                            .route(web::put().to(settings::put_student_window)),
                    )
                    .service(
                        web::resource("/windows/staff")
                            .route(web::put().to(settings::put_staff_window)),
                    )
                    .service(
                        web::resource("/windows/security/{shift}")
                            .route(web::put().to(settings::put_security_window))
                            .route(web::delete().to(settings::delete_security_window)),
                    )
                    .service(
                        web::resource("/holidays/weekly")
                            .route(web::get().to(settings::get_weekly_holidays))
                            .route(web::put().to(settings::put_weekly_holidays)),
                    )
                    .service(
                        web::resource("/holidays")
                            .route(web::get().to(settings::list_holidays))
                            .route(web::post().to(settings::create_holiday)),
                    )
                    .service(
                        web::resource("/holidays/{id}")
                            .route(web::delete().to(settings::delete_holiday)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("/daily").route(web::get().to(dashboard::daily)))
                    .service(web::resource("/period").route(web::get().to(dashboard::period))),
            )
            .service(
                web::scope("/classes")
                    .service(
                        web::resource("")
                            .route(web::get().to(class::list_classes))
                            .route(web::post().to(class::create_class)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(class::update_class))
                            .route(web::delete().to(class::delete_class)),
                    ),
            )
            .service(
                web::scope("/students")
                    .service(
                        web::resource("")
                            .route(web::get().to(student::list_students))
                            .route(web::post().to(student::create_student)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(student::update_student))
                            .route(web::delete().to(student::delete_student)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            ),
    );
}
