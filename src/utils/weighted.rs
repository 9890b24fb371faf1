use rand::Rng;

pub trait Weighted {
    fn weight(&self) -> f64;
}

/// 累积权重轮盘选择
///
/// r 取自 [0, total)，按顺序依次减去各项权重，落入的第一项即为结果。
/// 浮点累积误差导致循环走完仍未命中时返回最后一项；空池返回 None。
pub fn pick_one<'a, T: Weighted, R: Rng + ?Sized>(pool: &'a [T], rng: &mut R) -> Option<&'a T> {
    let total: f64 = pool.iter().map(Weighted::weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return pool.last();
    }

    let mut r = rng.gen_range(0.0..total);
    for item in pool {
        let w = item.weight();
        if r < w {
            return Some(item);
        }
        r -= w;
    }
    pool.last()
}
