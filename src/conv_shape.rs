use serde::{Deserialize, Serialize};

/// 张量的逻辑形状（进入渲染之前的描述）
/// 轴约定：x = 通道轴，y = 高度，z = 宽度
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TensorSpec {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub padding: usize,
}

/// 作用在输入张量上的卷积算子参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConvParams {
    pub filter_size: usize,
    pub stride: usize,
    pub channel_out: usize,
}

/// 推导出的输出空间尺寸
/// `valid == false` 表示参数组合在数学上不成立（输出尺寸非整数），
/// 此时 width/height 无意义，下游不得继续构建网格
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputShape {
    pub width: usize,
    pub height: usize,
    pub valid: bool,
}

/// 前置条件检查：维度与步长必须为正
/// 违反属于上游传参错误，与"参数组合无效"是两类不同的失败
pub fn validate_params(input: &TensorSpec, conv: &ConvParams) -> Result<(), String> {
    if input.width == 0 || input.height == 0 || input.channels == 0 {
        return Err(format!(
            "输入张量维度必须为正: {}×{}×{}",
            input.width, input.height, input.channels
        ));
    }
    if conv.filter_size == 0 {
        return Err("filter_size 必须为正".to_string());
    }
    if conv.stride == 0 {
        return Err("stride 必须为正".to_string());
    }
    if conv.channel_out == 0 {
        return Err("channel_out 必须为正".to_string());
    }
    Ok(())
}

/// 计算卷积输出形状
///
/// 每个空间轴独立套用公式 `(S - filter_size + 2*padding) / stride + 1`，
/// 两个轴都整除才算有效。无效组合是交互编辑中的常态，
/// 以 `valid` 标志返回而不是错误
pub fn compute_output_shape(
    input: &TensorSpec,
    conv: &ConvParams,
) -> Result<OutputShape, String> {
    validate_params(input, conv)?;

    match (
        axis_output_size(input.width, input.padding, conv),
        axis_output_size(input.height, input.padding, conv),
    ) {
        (Some(width), Some(height)) => Ok(OutputShape {
            width,
            height,
            valid: true,
        }),
        _ => Ok(OutputShape {
            width: 0,
            height: 0,
            valid: false,
        }),
    }
}

/// 单轴输出尺寸；非整数或卷积核超出加 padding 后的范围时返回 None
fn axis_output_size(size: usize, padding: usize, conv: &ConvParams) -> Option<usize> {
    let padded = size + 2 * padding;
    if padded < conv.filter_size {
        return None;
    }
    let span = padded - conv.filter_size;
    if span % conv.stride != 0 {
        return None;
    }
    Some(span / conv.stride + 1)
}

/// 未取整的原始输出尺寸，用于无效组合时的提示信息
pub fn raw_output_size(size: usize, padding: usize, conv: &ConvParams) -> f64 {
    (size as f64 - conv.filter_size as f64 + 2.0 * padding as f64) / conv.stride as f64 + 1.0
}
