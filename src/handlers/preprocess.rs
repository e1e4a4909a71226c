use std::time::Instant;

use actix_web::{HttpResponse, Responder, post, web};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::conv_shape::OutputShape;
use crate::handlers::layout::ConvQuery;
use crate::layout::{self, LabelAnchor, LayoutResult};
use crate::task::{ChunkDescriptor, TaskData};

#[derive(Deserialize)]
pub struct PreprocessRequest {
    #[serde(flatten)]
    pub params: ConvQuery,
    /// 每个分块包含的块描述数量
    pub chunk_size: usize,
}

#[derive(Serialize, Clone)]
pub struct PreprocessResponse {
    pub task_id: String,
    pub valid: bool,
    pub output_shape: OutputShape,
    pub block_count: usize,
    pub block_extent: f32,
    pub chunk_size: usize,
    pub chunks: Vec<ChunkDescriptor>,
    /// 标签数量很小，直接随预处理响应返回，不参与分块
    pub labels: Vec<LabelAnchor>,
}

/// 预处理布局：快速建立任务并在后台切分块描述
///
/// 大布局（channel_out 或输入尺寸很大时）一次性 JSON 返回过重，
/// 这里只做轻量操作：验证参数、计算布局、登记任务、返回分块信息，
/// 块数据的切分放到后台执行，前端随后按 chunk 拉取二进制数据
#[post("/conv-layout/preprocess")]
pub async fn preprocess_conv_layout(
    data: web::Data<AppState>,
    payload: web::Json<PreprocessRequest>,
) -> impl Responder {
    // ==================== 步骤 1: 参数验证与布局计算 ====================
    // 确保分块大小至少为 1，避免除零或无效分块
    let chunk_size = payload.chunk_size.max(1);
    let (input, conv) = payload.params.specs();

    let layout = match layout::build_layout(&input, &conv) {
        Ok(LayoutResult::Layout(layout)) => layout,
        // 无效组合是正常结局，返回 200 + valid=false，不建任务
        Ok(LayoutResult::Invalid {
            raw_width,
            raw_height,
        }) => {
            return HttpResponse::Ok().json(serde_json::json!({
                "valid": false,
                "message": "输出尺寸不是整数，当前参数组合无法构成卷积",
                "raw_width": raw_width,
                "raw_height": raw_height,
            }));
        }
        Err(details) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "参数不合法",
                "details": details,
            }));
        }
    };

    // ==================== 步骤 2: 计算分块信息 ====================
    // 按块总数划分，不需要先展平就能得到分块边界
    let block_count = layout.block_count();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    while start < block_count {
        let end = (start + chunk_size).min(block_count);
        chunks.push(ChunkDescriptor { index, start, end });
        start = end;
        index += 1;
    }

    // ==================== 步骤 3: 创建任务存储 ====================
    // 创建 TaskData（此时 chunk 还未切分，chunk_data 中都是 None）
    let task_data = TaskData::new(chunks.clone());
    let task_id = data.task_store.insert(task_data);

    let Some(task) = data.task_store.get(&task_id) else {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "创建任务失败",
        }));
    };

    let response = PreprocessResponse {
        task_id: task_id.clone(),
        valid: true,
        output_shape: layout.output_shape,
        block_count,
        block_extent: layout::BLOCK_EXTENT,
        chunk_size,
        chunks: chunks.clone(),
        labels: layout.label_descriptors(),
    };

    // ==================== 步骤 4: 后台切分块描述 ====================
    // 展平和切分在后台执行，不阻塞预处理响应；
    // 前端请求未就绪的 chunk 时会收到 202
    actix_web::rt::spawn(async move {
        let split_start = Instant::now();
        let descriptors = layout.block_descriptors();

        let mut handles = Vec::new();
        for descriptor in chunks {
            let task_ref = task.clone();
            let chunk_blocks = descriptors[descriptor.start..descriptor.end].to_vec();

            let handle = actix_web::rt::spawn(async move {
                task_ref.set_chunk(descriptor.index, chunk_blocks);
            });
            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.await;
        }

        println!(
            "[后台切分] 任务 {} 切分完成，共 {} 个 chunk / {} 个块，耗时 {:.2}ms",
            task_id,
            task.chunks.len(),
            block_count,
            split_start.elapsed().as_secs_f64() * 1000.0
        );
    });

    // ==================== 步骤 5: 立即返回分块信息 ====================
    HttpResponse::Ok().json(response)
}
