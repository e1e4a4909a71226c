use serde::Serialize;

/// 不透明的 RGB 颜色值，渲染端直接使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// 输入张量数据区域的颜色（白色）
pub const DATA_COLOR: Rgb = Rgb {
    r: 0xf2,
    g: 0xf2,
    b: 0xf2,
};

/// padding 外壳的颜色（红色），与数据区域形成对比
pub const PADDING_COLOR: Rgb = Rgb {
    r: 0xd9,
    g: 0x4a,
    b: 0x4a,
};

/// 输出网格在逐通道上色之前的中性底色
pub const OUTPUT_BASE_COLOR: Rgb = Rgb {
    r: 0x88,
    g: 0x88,
    b: 0x88,
};

/// 调色板可区分的最大梯度步数
/// 通道数超过该值时颜色按 `i % MAX_DISTINCT_STEPS` 循环复用
pub const MAX_DISTINCT_STEPS: usize = 12;

/// 梯度两端的锚点色相（度），从蓝色渐变到橙色
const HUE_START: f32 = 205.0;
const HUE_END: f32 = 20.0;

/// 为 `count` 个输出通道生成有序调色板
///
/// 同样的 `count` 总是产生同样的序列；相邻通道索引得到
/// 梯度上相邻的颜色，便于肉眼追踪通道与卷积核的对应关系
pub fn generate_palette(count: usize) -> Vec<Rgb> {
    let distinct = count.clamp(1, MAX_DISTINCT_STEPS);
    (0..count)
        .map(|i| {
            let step = i % distinct;
            let t = if distinct == 1 {
                0.0
            } else {
                step as f32 / (distinct - 1) as f32
            };
            let hue = HUE_START + (HUE_END - HUE_START) * t;
            hsl_to_rgb(hue, 0.72, 0.56)
        })
        .collect()
}

/// HSL 转 RGB，h 取值 [0, 360)，s/l 取值 [0, 1]
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h % 360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgb {
        r: ((r1 + m) * 255.0).round() as u8,
        g: ((g1 + m) * 255.0).round() as u8,
        b: ((b1 + m) * 255.0).round() as u8,
    }
}
