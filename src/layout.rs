use serde::Serialize;

use crate::block_factory;
use crate::color::{self, Rgb};
use crate::conv_shape::{self, ConvParams, OutputShape, TensorSpec};
use crate::voxel_grid::VoxelGrid;

/// 每个块的轴对齐单位边长
pub const BLOCK_EXTENT: f32 = 1.0;

/// 输入簇、卷积核簇、输出簇在通道轴（x）上的间隔，保证三簇不相交
const CLUSTER_GAP: f32 = 4.0;

/// 标签锚点悬浮在簇顶上方的高度
const LABEL_LIFT: f32 = 2.0;

/// 标签锚点：外部标签渲染方在投影后的该位置放置 DOM 标签
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub position: [f32; 3],
    pub text: String,
}

/// 一个定位好的网格簇：网格本体、世界坐标原点、标签锚点
pub struct LayoutGroup {
    pub name: String,
    pub origin: [f32; 3],
    pub grid: VoxelGrid,
    pub label_anchors: Vec<LabelAnchor>,
}

/// 交给渲染方的单个块描述
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockDescriptor {
    pub position: [f32; 3],
    pub color: Rgb,
    pub extent: f32,
}

/// 一次完整的布局结果：输入簇、channel_out 个卷积核簇、输出簇
pub struct ConvLayout {
    pub output_shape: OutputShape,
    pub input: LayoutGroup,
    pub filters: Vec<LayoutGroup>,
    pub output: LayoutGroup,
}

/// 布局计算的两种正常结局
/// 参数组合无效（输出尺寸非整数）不是错误，调用方据此跳过重建
pub enum LayoutResult {
    Layout(ConvLayout),
    Invalid { raw_width: f64, raw_height: f64 },
}

impl ConvLayout {
    /// 按固定顺序遍历所有簇：输入 → 卷积核 0..N → 输出
    pub fn groups(&self) -> impl Iterator<Item = &LayoutGroup> {
        std::iter::once(&self.input)
            .chain(self.filters.iter())
            .chain(std::iter::once(&self.output))
    }

    /// 所有簇的块总数
    pub fn block_count(&self) -> usize {
        self.groups().map(|g| g.grid.len()).sum()
    }

    /// 展平为渲染方消费的有序块描述列表
    /// 顺序由簇顺序和网格的 (x, y, z) 升序遍历共同确定，可复现
    pub fn block_descriptors(&self) -> Vec<BlockDescriptor> {
        let mut descriptors = Vec::with_capacity(self.block_count());
        for group in self.groups() {
            for ([x, y, z], block) in group.grid.blocks() {
                descriptors.push(BlockDescriptor {
                    position: [
                        group.origin[0] + x as f32,
                        group.origin[1] + y as f32,
                        group.origin[2] + z as f32,
                    ],
                    color: block.color,
                    extent: BLOCK_EXTENT,
                });
            }
        }
        descriptors
    }

    /// 所有标签锚点（输入、卷积核簇、输出各一个）
    pub fn label_descriptors(&self) -> Vec<LabelAnchor> {
        self.groups()
            .flat_map(|g| g.label_anchors.iter().cloned())
            .collect()
    }
}

/// 计算完整布局
///
/// 流程：先过输出形状的有效性门槛；有效时构建输入网格（负通道轴方向）、
/// channel_out 个卷积核网格（沿 y 轴按 filter_size + 1 间距堆叠）、
/// 输出网格（正通道轴方向，空间轴上相对输入居中）。
/// 纯函数：同样的参数每次产生同样的布局
pub fn build_layout(input: &TensorSpec, conv: &ConvParams) -> Result<LayoutResult, String> {
    let shape = conv_shape::compute_output_shape(input, conv)?;
    if !shape.valid {
        return Ok(LayoutResult::Invalid {
            raw_width: conv_shape::raw_output_size(input.width, input.padding, conv),
            raw_height: conv_shape::raw_output_size(input.height, input.padding, conv),
        });
    }

    let palette = color::generate_palette(conv.channel_out);

    // 输入簇：padding 外壳 + 数据区域，放在通道轴负方向
    let input_grid = block_factory::build_padded_tensor(
        input,
        color::DATA_COLOR,
        color::PADDING_COLOR,
    )?;
    let input_origin = [-(input.channels as f32 + CLUSTER_GAP), 0.0, 0.0];
    let input_label = label_above(
        input_origin,
        input_grid.shape(),
        format!(
            "输入 {}×{}×{} (padding={})",
            input.width, input.height, input.channels, input.padding
        ),
    );
    let input_group = LayoutGroup {
        name: "input".to_string(),
        origin: input_origin,
        label_anchors: vec![input_label],
        grid: input_grid,
    };

    // 卷积核簇：每个卷积核一个单色网格，沿 y 轴堆叠，间距比核边长大 1，
    // 无论 channel_out 多大都不会相互重叠
    let filter_spacing = (conv.filter_size + 1) as f32;
    let mut filters = Vec::with_capacity(conv.channel_out);
    for i in 0..conv.channel_out {
        let grid = block_factory::build_filter(
            conv.filter_size,
            input.channels,
            palette[i % palette.len()],
        )?;
        filters.push(LayoutGroup {
            name: format!("filter_{}", i),
            origin: [0.0, i as f32 * filter_spacing, 0.0],
            label_anchors: Vec::new(),
            grid,
        });
    }

    // 整个卷积核簇共用一个标签，挂在堆叠顶端上方
    let cluster_top = (conv.channel_out - 1) as f32 * filter_spacing + conv.filter_size as f32;
    let filter_label = LabelAnchor {
        position: [
            input.channels as f32 / 2.0,
            cluster_top + LABEL_LIFT,
            conv.filter_size as f32 / 2.0,
        ],
        text: format!(
            "卷积核 {}×{}×{} ×{}",
            conv.filter_size, conv.filter_size, input.channels, conv.channel_out
        ),
    };
    if let Some(first) = filters.first_mut() {
        first.label_anchors.push(filter_label);
    }

    // 输出簇：channel banding，放在通道轴正方向（卷积核簇之外），
    // y/z 轴上相对（加 padding 后的）输入居中
    let output_grid =
        block_factory::build_output(shape.width, shape.height, conv.channel_out, &palette)?;
    let padded_height = (input.height + 2 * input.padding) as f32;
    let padded_width = (input.width + 2 * input.padding) as f32;
    let output_origin = [
        input.channels as f32 + CLUSTER_GAP,
        (padded_height - shape.height as f32) / 2.0,
        (padded_width - shape.width as f32) / 2.0,
    ];
    let output_label = label_above(
        output_origin,
        output_grid.shape(),
        format!("输出 {}×{}×{}", shape.width, shape.height, conv.channel_out),
    );
    let output_group = LayoutGroup {
        name: "output".to_string(),
        origin: output_origin,
        label_anchors: vec![output_label],
        grid: output_grid,
    };

    Ok(LayoutResult::Layout(ConvLayout {
        output_shape: shape,
        input: input_group,
        filters,
        output: output_group,
    }))
}

/// 锚点放在簇包围盒的顶面中心上方
fn label_above(origin: [f32; 3], shape: [usize; 3], text: String) -> LabelAnchor {
    LabelAnchor {
        position: [
            origin[0] + shape[0] as f32 / 2.0,
            origin[1] + shape[1] as f32 + LABEL_LIFT,
            origin[2] + shape[2] as f32 / 2.0,
        ],
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_one() -> (TensorSpec, ConvParams) {
        (
            TensorSpec {
                width: 5,
                height: 5,
                channels: 3,
                padding: 1,
            },
            ConvParams {
                filter_size: 3,
                stride: 1,
                channel_out: 8,
            },
        )
    }

    fn expect_layout(result: LayoutResult) -> ConvLayout {
        match result {
            LayoutResult::Layout(layout) => layout,
            LayoutResult::Invalid { .. } => panic!("参数组合应当有效"),
        }
    }

    #[test]
    fn scenario_one_grid_sizes() {
        let (input, conv) = scenario_one();
        let layout = expect_layout(build_layout(&input, &conv).unwrap());

        assert!(layout.output_shape.valid);
        assert_eq!(layout.output_shape.width, 5);
        assert_eq!(layout.output_shape.height, 5);

        assert_eq!(layout.input.grid.shape(), [3, 7, 7]);
        assert_eq!(layout.filters.len(), 8);
        for filter in &layout.filters {
            assert_eq!(filter.grid.shape(), [3, 3, 3]);
        }
        assert_eq!(layout.output.grid.shape(), [8, 5, 5]);

        let expected = 3 * 7 * 7 + 8 * 27 + 8 * 5 * 5;
        assert_eq!(layout.block_count(), expected);
        assert_eq!(layout.block_descriptors().len(), expected);
    }

    #[test]
    fn layout_is_idempotent() {
        let (input, conv) = scenario_one();
        let first = expect_layout(build_layout(&input, &conv).unwrap());
        let second = expect_layout(build_layout(&input, &conv).unwrap());

        assert_eq!(first.block_descriptors(), second.block_descriptors());
        assert_eq!(first.label_descriptors(), second.label_descriptors());
    }

    #[test]
    fn clusters_do_not_overlap_on_channel_axis() {
        let (input, conv) = scenario_one();
        let layout = expect_layout(build_layout(&input, &conv).unwrap());

        // 每个块占据 [x, x+1)，按簇统计通道轴上的覆盖区间
        let input_max = layout.input.origin[0] + layout.input.grid.channels() as f32;
        let filter_min = layout.filters[0].origin[0];
        let filter_max = filter_min + layout.filters[0].grid.channels() as f32;
        let output_min = layout.output.origin[0];

        assert!(input_max <= filter_min);
        assert!(filter_max <= output_min);
    }

    #[test]
    fn filters_do_not_overlap_each_other() {
        let (input, conv) = scenario_one();
        let layout = expect_layout(build_layout(&input, &conv).unwrap());

        for pair in layout.filters.windows(2) {
            let top = pair[0].origin[1] + pair[0].grid.height() as f32;
            assert!(top < pair[1].origin[1]);
        }
    }

    #[test]
    fn three_label_anchors_with_resolved_dimensions() {
        let (input, conv) = scenario_one();
        let layout = expect_layout(build_layout(&input, &conv).unwrap());

        let labels = layout.label_descriptors();
        assert_eq!(labels.len(), 3);
        assert!(labels[0].text.contains("5×5×3"));
        assert!(labels[1].text.contains("3×3×3"));
        assert!(labels[2].text.contains("5×5×8"));
    }

    #[test]
    fn invalid_combination_builds_no_groups() {
        let input = TensorSpec {
            width: 5,
            height: 5,
            channels: 3,
            padding: 1,
        };
        let conv = ConvParams {
            filter_size: 3,
            stride: 3,
            channel_out: 8,
        };
        match build_layout(&input, &conv).unwrap() {
            LayoutResult::Invalid {
                raw_width,
                raw_height,
            } => {
                assert!((raw_width - (4.0 / 3.0 + 1.0)).abs() < 1e-9);
                assert!((raw_height - (4.0 / 3.0 + 1.0)).abs() < 1e-9);
            }
            LayoutResult::Layout(_) => panic!("非整数输出尺寸应当判为无效"),
        }
    }

    #[test]
    fn precondition_fault_is_an_error() {
        let input = TensorSpec {
            width: 5,
            height: 5,
            channels: 3,
            padding: 1,
        };
        let conv = ConvParams {
            filter_size: 3,
            stride: 0,
            channel_out: 8,
        };
        assert!(build_layout(&input, &conv).is_err());
    }

    #[test]
    fn output_banding_survives_flattening() {
        let (input, conv) = scenario_one();
        let layout = expect_layout(build_layout(&input, &conv).unwrap());
        let palette = color::generate_palette(conv.channel_out);

        for ([x, _, _], block) in layout.output.grid.blocks() {
            assert_eq!(block.color, palette[x % palette.len()]);
        }
    }
}
