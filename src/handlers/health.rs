use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;
use crate::color::MAX_DISTINCT_STEPS;
use crate::layout::BLOCK_EXTENT;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "卷积布局数据服务",
        "endpoints": [
            "/conv-layout?w_in=&h_in=&channel_in=&filter_size=&channel_out=&padding=&stride=",
            "/conv-layout/preprocess",
            "/conv-layout/chunk?task_id=&chunk_index=",
        ],
        "block_extent": BLOCK_EXTENT,
        "palette_distinct_steps": MAX_DISTINCT_STEPS,
        "active_tasks": data.task_store.task_count(),
    }))
}
