use crate::color::Rgb;

/// 单个体素块，只携带颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub color: Rgb,
}

/// 半开区间 `[x1,x2) × [y1,y2) × [z1,z2)`，用于批量重涂一个长方体子区域
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub x1: usize,
    pub x2: usize,
    pub y1: usize,
    pub y2: usize,
    pub z1: usize,
    pub z2: usize,
}

/// 体素网格数据结构
/// 稠密的三维块数组：x = 通道轴，y = 高度，z = 宽度
/// 尺寸在创建时固定，改形状意味着丢弃重建
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    channels: usize,
    height: usize,
    width: usize,
    /// 按 (x, y, z) 字典序存储，z 变化最快
    /// 索引计算: index = (x * height + y) * width + z
    blocks: Vec<Block>,
}

impl VoxelGrid {
    /// 创建新的体素网格，所有块初始化为 `default_color`
    pub fn new(
        channels: usize,
        height: usize,
        width: usize,
        default_color: Rgb,
    ) -> Result<Self, String> {
        if channels == 0 || height == 0 || width == 0 {
            return Err(format!(
                "网格维度必须为正: {}×{}×{}",
                channels, height, width
            ));
        }

        let total = channels * height * width;
        Ok(VoxelGrid {
            channels,
            height,
            width,
            blocks: vec![
                Block {
                    color: default_color
                };
                total
            ],
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// 获取 shape: [channels, height, width]
    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }

    /// 块总数
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.height + y) * self.width + z
    }

    /// 读取指定坐标的块，越界返回 None
    pub fn block(&self, x: usize, y: usize, z: usize) -> Option<&Block> {
        if x >= self.channels || y >= self.height || z >= self.width {
            return None;
        }
        self.blocks.get(self.index(x, y, z))
    }

    /// 将区域内所有块重涂为 `color`，后写覆盖先写，不做混合
    /// 区域必须完全落在网格范围内：越界是内部契约错误，
    /// 直接失败而不是静默截断，避免掩盖布局计算的 bug
    pub fn paint_region(&mut self, region: &Region, color: Rgb) -> Result<(), String> {
        if region.x1 > region.x2 || region.y1 > region.y2 || region.z1 > region.z2 {
            return Err(format!("区域端点顺序不合法: {:?}", region));
        }
        if region.x2 > self.channels || region.y2 > self.height || region.z2 > self.width {
            return Err(format!(
                "区域 {:?} 超出网格范围 {}×{}×{}",
                region, self.channels, self.height, self.width
            ));
        }

        for x in region.x1..region.x2 {
            for y in region.y1..region.y2 {
                for z in region.z1..region.z2 {
                    let idx = self.index(x, y, z);
                    self.blocks[idx].color = color;
                }
            }
        }
        Ok(())
    }

    /// 按 (x, y, z) 升序稳定遍历所有块
    /// 确定的顺序保证测试输出和渲染网格构建顺序可复现
    pub fn blocks(&self) -> impl Iterator<Item = ([usize; 3], &Block)> {
        let height = self.height;
        let width = self.width;
        self.blocks.iter().enumerate().map(move |(i, block)| {
            let z = i % width;
            let y = (i / width) % height;
            let x = i / (width * height);
            ([x, y, z], block)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{DATA_COLOR, PADDING_COLOR};

    #[test]
    fn grid_is_dense_and_rectangular() {
        let grid = VoxelGrid::new(3, 7, 7, PADDING_COLOR).unwrap();
        assert_eq!(grid.len(), 3 * 7 * 7);

        let mut seen = std::collections::HashSet::new();
        for (coord, block) in grid.blocks() {
            assert!(coord[0] < 3 && coord[1] < 7 && coord[2] < 7);
            assert_eq!(block.color, PADDING_COLOR);
            assert!(seen.insert(coord), "坐标 {:?} 出现了两次", coord);
        }
        assert_eq!(seen.len(), 3 * 7 * 7);
    }

    #[test]
    fn traversal_is_lexicographic() {
        let grid = VoxelGrid::new(2, 2, 2, DATA_COLOR).unwrap();
        let coords: Vec<[usize; 3]> = grid.blocks().map(|(c, _)| c).collect();
        let mut sorted = coords.clone();
        sorted.sort();
        assert_eq!(coords, sorted);
        assert_eq!(coords[0], [0, 0, 0]);
        assert_eq!(coords[1], [0, 0, 1]);
        assert_eq!(coords[2], [0, 1, 0]);
    }

    #[test]
    fn paint_region_sets_exactly_the_sub_volume() {
        let mut grid = VoxelGrid::new(3, 5, 5, PADDING_COLOR).unwrap();
        let region = Region {
            x1: 0,
            x2: 3,
            y1: 1,
            y2: 4,
            z1: 1,
            z2: 4,
        };
        grid.paint_region(&region, DATA_COLOR).unwrap();

        for ([x, y, z], block) in grid.blocks() {
            let inside = (1..4).contains(&y) && (1..4).contains(&z) && x < 3;
            let expected = if inside { DATA_COLOR } else { PADDING_COLOR };
            assert_eq!(block.color, expected, "坐标 ({}, {}, {})", x, y, z);
        }
    }

    #[test]
    fn last_paint_wins() {
        let mut grid = VoxelGrid::new(2, 2, 2, PADDING_COLOR).unwrap();
        let all = Region {
            x1: 0,
            x2: 2,
            y1: 0,
            y2: 2,
            z1: 0,
            z2: 2,
        };
        grid.paint_region(&all, DATA_COLOR).unwrap();
        grid.paint_region(&all, PADDING_COLOR).unwrap();
        assert!(grid.blocks().all(|(_, b)| b.color == PADDING_COLOR));
    }

    #[test]
    fn out_of_bounds_region_fails_fast() {
        let mut grid = VoxelGrid::new(2, 2, 2, DATA_COLOR).unwrap();
        let region = Region {
            x1: 0,
            x2: 3,
            y1: 0,
            y2: 2,
            z1: 0,
            z2: 2,
        };
        assert!(grid.paint_region(&region, PADDING_COLOR).is_err());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(VoxelGrid::new(0, 2, 2, DATA_COLOR).is_err());
        assert!(VoxelGrid::new(2, 0, 2, DATA_COLOR).is_err());
        assert!(VoxelGrid::new(2, 2, 0, DATA_COLOR).is_err());
    }
}
