use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::boxes::{dtos as boxes_dtos, handlers as boxes_handlers};
use crate::features::entries::{dtos as entries_dtos, handlers as entries_handlers};
use crate::features::files::handlers as files_handlers;
use crate::features::public::{dtos as public_dtos, handlers as public_handlers};
use crate::shared::types::{ErrorBody, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_me,
        auth::handlers::logout,
        // Boxes
        boxes_handlers::list_boxes,
        boxes_handlers::get_box,
        boxes_handlers::create_box,
        boxes_handlers::update_box,
        boxes_handlers::delete_box,
        boxes_handlers::get_box_qr,
        // Entries
        entries_handlers::upload_pdfs,
        entries_handlers::create_title,
        entries_handlers::delete_pdf,
        // Public
        public_handlers::get_public_box,
        public_handlers::get_public_box_stats,
        // Files
        files_handlers::serve_file,
        files_handlers::download_file,
    ),
    components(
        schemas(
            // Shared
            ErrorBody,
            MessageResponse,
            // Auth
            auth::dtos::RegisterDto,
            auth::dtos::LoginDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::UserResponseDto,
            // Boxes
            boxes_dtos::BoxStatus,
            boxes_dtos::CreateBoxDto,
            boxes_dtos::UpdateBoxDto,
            boxes_dtos::BoxResponseDto,
            boxes_dtos::BoxDetailDto,
            boxes_dtos::QrCodeResponseDto,
            // Entries
            entries_dtos::CreateTitleDto,
            entries_dtos::UploadPdfsForm,
            entries_dtos::EntryResponseDto,
            // Public
            public_dtos::PublicBoxDto,
            public_dtos::BoxStatsDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and session info"),
        (name = "boxes", description = "Box lifecycle for owners"),
        (name = "entries", description = "Documents inside a box"),
        (name = "public", description = "Unauthenticated box views"),
        (name = "files", description = "Stored PDF delivery")
    ),
    info(
        title = "PDF Box API",
        description = "Multi-tenant PDF document organizer with QR-shareable public box views"
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
