mod auth_handle;
mod sensor_handle;
mod setting_handle;
mod system_handle;

pub use auth_handle::*;
pub use sensor_handle::*;
pub use setting_handle::*;
pub use system_handle::*;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        get_service_info,
        get_health,
        get_sensor_data,
        get_optimization_status,
        update_optimization_status,
        register,
        login,
        get_current_user,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "system", description = "Service status"),
        (name = "sensor", description = "Historical climate readings"),
        (name = "setting", description = "Automatic control switch"),
        (name = "auth", description = "Accounts and tokens"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
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
