use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::conv_shape::{ConvParams, TensorSpec};
use crate::layout::{self, LayoutResult};

/// 卷积超参数，GET 的查询参数和 preprocess 的 JSON 请求体共用
#[derive(Debug, Clone, Deserialize)]
pub struct ConvQuery {
    pub w_in: usize,
    pub h_in: usize,
    pub channel_in: usize,
    pub filter_size: usize,
    pub channel_out: usize,
    /// 缺省为 0（无 padding）
    #[serde(default)]
    pub padding: usize,
    /// 缺省为 1
    pub stride: Option<usize>,
}

impl ConvQuery {
    pub fn specs(&self) -> (TensorSpec, ConvParams) {
        (
            TensorSpec {
                width: self.w_in,
                height: self.h_in,
                channels: self.channel_in,
                padding: self.padding,
            },
            ConvParams {
                filter_size: self.filter_size,
                stride: self.stride.unwrap_or(1),
                channel_out: self.channel_out,
            },
        )
    }
}

/// 布局接口：一次返回完整的块描述与标签
/// 例如: /conv-layout?w_in=5&h_in=5&channel_in=3&filter_size=3&channel_out=8&padding=1
#[get("/conv-layout")]
pub async fn get_conv_layout(query: web::Query<ConvQuery>) -> impl Responder {
    let (input, conv) = query.specs();

    let result = match layout::build_layout(&input, &conv) {
        Ok(result) => result,
        Err(details) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "参数不合法",
                "details": details,
            }));
        }
    };

    match result {
        // 无效组合是交互编辑中的常态，返回 200 + valid=false，
        // 前端显示非阻塞提示并保留上一次有效的可视化
        LayoutResult::Invalid {
            raw_width,
            raw_height,
        } => HttpResponse::Ok().json(serde_json::json!({
            "valid": false,
            "message": "输出尺寸不是整数，当前参数组合无法构成卷积",
            "raw_width": raw_width,
            "raw_height": raw_height,
        })),
        LayoutResult::Layout(layout) => {
            let blocks = layout.block_descriptors();
            HttpResponse::Ok().json(serde_json::json!({
                "valid": true,
                "output_shape": layout.output_shape,
                "block_extent": layout::BLOCK_EXTENT,
                "block_count": blocks.len(),
                "blocks": blocks,
                "labels": layout.label_descriptors(),
            }))
        }
    }
}
