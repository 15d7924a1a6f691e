use utoipa::openapi::server::ServerBuilder;
use utoipa::{Modify, OpenApi};

/// 按配置的 `api.prefix` 生成 Servers，使 Swagger UI 的 "Try it out" 命中真实路径。
pub struct ApiServers {
    pub prefix: String,
}

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let prefix = self.prefix.trim_end_matches('/');
        let mut servers = vec![
            ServerBuilder::new()
                .url("/")
                .description(Some("根路径（/health）"))
                .build(),
        ];
        if !prefix.is_empty() {
            servers.insert(
                0,
                ServerBuilder::new()
                    .url(prefix)
                    .description(Some("业务接口（对应 config.api.prefix）"))
                    .build(),
            );
        }
        openapi.servers = Some(servers);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::crop::handler::crop_image,
    ),
    components(schemas(
        crate::error::ProblemDetails,
        crate::features::crop::CropMessage,
        crate::features::crop::CropUploadForm,
        crate::features::health::HealthResponse,
    )),
    tags(
        (name = "Crop", description = "图片裁剪：上传图片并返回裁剪后的 JPEG。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "KawaiiCrop API",
        version = env!("CARGO_PKG_VERSION"),
        description = "图片裁剪服务（Axum + utoipa）。/crop 挂载在 `config.api.prefix` 下（默认无前缀）。"
    )
)]
pub struct ApiDoc;

/// 生成带 Servers 信息的 OpenAPI 文档
pub fn openapi_for_prefix(prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    ApiServers {
        prefix: prefix.to_string(),
    }
    .modify(&mut doc);
    doc
}
