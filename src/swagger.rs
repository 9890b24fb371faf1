use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::action::dispatch,
        handlers::action::health,
    ),
    components(
        schemas(
            ActionRequest,
            ResponseStatus,
            Character,
            DrawType,
            DrawLogEntry,
            DrawResponse,
            InitUserResponse,
        )
    ),
    tags(
        (name = "gacha", description = "Gacha action dispatch API"),
    ),
    info(
        title = "Gacha Backend API",
        version = "0.1.0",
        description = "Ticket balances, weighted character draws and draw audit logs"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
