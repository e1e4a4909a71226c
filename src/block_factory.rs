use crate::color::{self, Rgb};
use crate::conv_shape::TensorSpec;
use crate::voxel_grid::{Region, VoxelGrid};

/// 构建带 padding 外壳的张量网格
///
/// 先整体填充 `padding_color`，再把内部数据子区域
/// `[0,channels) × [p, height+p) × [p, width+p)` 重涂为 `data_color`，
/// padding 在渲染结果中呈现为一圈颜色不同的边框。
/// `padding == 0` 时外壳厚度为零，整个网格都是数据色（合法的退化情形）
pub fn build_padded_tensor(
    spec: &TensorSpec,
    data_color: Rgb,
    padding_color: Rgb,
) -> Result<VoxelGrid, String> {
    let padded_height = spec.height + 2 * spec.padding;
    let padded_width = spec.width + 2 * spec.padding;

    let mut grid = VoxelGrid::new(spec.channels, padded_height, padded_width, padding_color)?;
    grid.paint_region(
        &Region {
            x1: 0,
            x2: spec.channels,
            y1: spec.padding,
            y2: spec.height + spec.padding,
            z1: spec.padding,
            z2: spec.width + spec.padding,
        },
        data_color,
    )?;
    Ok(grid)
}

/// 构建单个卷积核网格：无 padding，整体使用一个调色板颜色
/// 单色让卷积核与它对应的输出通道在视觉上一一对应
pub fn build_filter(filter_size: usize, channels: usize, color: Rgb) -> Result<VoxelGrid, String> {
    VoxelGrid::new(channels, filter_size, filter_size, color)
}

/// 构建输出网格：先以中性底色创建，再把每个通道所在的
/// 完整 x 切片重涂为该通道的调色板颜色（channel banding）
pub fn build_output(
    width: usize,
    height: usize,
    channel_out: usize,
    palette: &[Rgb],
) -> Result<VoxelGrid, String> {
    if palette.is_empty() {
        return Err("调色板不能为空".to_string());
    }

    let mut grid = VoxelGrid::new(channel_out, height, width, color::OUTPUT_BASE_COLOR)?;
    for i in 0..channel_out {
        grid.paint_region(
            &Region {
                x1: i,
                x2: i + 1,
                y1: 0,
                y2: height,
                z1: 0,
                z2: width,
            },
            palette[i % palette.len()],
        )?;
    }
    Ok(grid)
}
