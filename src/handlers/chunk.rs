use std::io::Write;

use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Deserialize;

use crate::app_state::AppState;

#[derive(Deserialize)]
pub struct ChunkQuery {
    pub task_id: String,
    pub chunk_index: usize,
}

/// 单个块描述在二进制流中的字节数：
/// position 3 × f32 (LE) + color 3 × u8
const BLOCK_RECORD_SIZE: usize = 15;

/// 拉取一个分块的块描述，gzip 压缩的小端二进制流
/// 每条记录依次为 x, y, z (f32) 和 r, g, b (u8)；
/// extent 是常量，已随预处理响应返回，不在流中重复
#[get("/conv-layout/chunk")]
pub async fn get_layout_chunk(
    data: web::Data<AppState>,
    query: web::Query<ChunkQuery>,
) -> impl Responder {
    let Some(task) = data.task_store.get(&query.task_id) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 task_id",
            "task_id": query.task_id,
        }));
    };

    let Some(descriptor) = task.chunks.get(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "无效的 chunk_index",
            "chunk_index": query.chunk_index,
        }));
    };

    // 检查 chunk 是否已就绪（后台切分是否完成）
    if !task.is_chunk_ready(query.chunk_index) {
        return HttpResponse::Accepted().json(serde_json::json!({
            "error": "chunk 正在切分中，请稍后重试",
            "task_id": query.task_id,
            "chunk_index": query.chunk_index,
            "status": "processing",
        }));
    }

    // 获取并移除 chunk 数据（请求后立即释放内存）
    // 如果 chunk 已被请求，take_chunk 会返回 None
    let Some(blocks) = task.take_chunk(query.chunk_index) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "chunk 已被请求或不存在",
            "task_id": query.task_id,
            "chunk_index": query.chunk_index,
        }));
    };

    // 将块描述序列化为二进制格式
    let mut bytes = Vec::with_capacity(blocks.len() * BLOCK_RECORD_SIZE);
    for block in &blocks {
        for coordinate in block.position {
            if let Err(e) = bytes.write_f32::<LittleEndian>(coordinate) {
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "写入 chunk 数据失败",
                    "details": e.to_string(),
                }));
            }
        }
        bytes.push(block.color.r);
        bytes.push(block.color.g);
        bytes.push(block.color.b);
    }

    // gzip 压缩后发送，布局数据重复度高，压缩收益明显
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let body = match encoder.write_all(&bytes).and_then(|_| encoder.finish()) {
        Ok(body) => body,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "压缩 chunk 数据失败",
                "details": e.to_string(),
            }));
        }
    };

    HttpResponse::Ok()
        .content_type(ContentType::octet_stream())
        .append_header(("Content-Encoding", "gzip"))
        .append_header(("X-Chunk-Index", descriptor.index.to_string()))
        .append_header(("X-Chunk-Start", descriptor.start.to_string()))
        .append_header(("X-Chunk-End", descriptor.end.to_string()))
        .append_header((
            "X-Chunk-Length",
            (descriptor.end - descriptor.start).to_string(),
        ))
        .append_header(("X-Chunk-Task", query.task_id.clone()))
        .body(body)
}
