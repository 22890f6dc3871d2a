//! 面积推导。所有面积检查都经由 [`min_realistic_area`]。

/// 每间卧室净面积（m²）。
pub const BEDROOM_NET: f64 = 12.0;
pub const BATHROOM_NET: f64 = 5.0;
/// 起居、厨房与入口的基础面积。
pub const BASE_NET: f64 = 25.0;
/// 交通面积系数（+15%）。
pub const CIRCULATION_FACTOR: f64 = 1.15;
/// 扣除约 13% 墙体占用后的净面积比。
pub const NET_TO_GROSS: f64 = 0.87;
/// 确认阶段复核使用的放宽系数。
pub const RECHECK_FACTOR: f64 = 0.9;

/// `ceil((bedrooms·12 + bathrooms·5 + 25) · 1.15 / 0.87)`
pub fn min_realistic_area(bedrooms: u32, bathrooms: u32) -> f64 {
    let net = f64::from(bedrooms) * BEDROOM_NET + f64::from(bathrooms) * BATHROOM_NET + BASE_NET;
    let with_circulation = net * CIRCULATION_FACTOR;
    (with_circulation / NET_TO_GROSS).ceil()
}

/// 超出此值仅给出提醒，更大的面积本身并不违规。
pub fn max_reasonable_area(bedrooms: u32, bathrooms: u32) -> f64 {
    f64::from(bedrooms) * 50.0 + f64::from(bathrooms) * 15.0 + 80.0
}

/// 卫生间数量超过卧室数加一时提醒。
#[inline]
pub fn bathroom_ratio_exceeded(bedrooms: u32, bathrooms: u32) -> bool {
    bathrooms > bedrooms.saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_bed_one_bath_needs_72() {
        assert_eq!(min_realistic_area(2, 1), 72.0);
        assert_eq!(max_reasonable_area(2, 1), 195.0);
    }

    #[test]
    fn derivation_steps() {
        // (0 + 0 + 25) · 1.15 = 28.75，/ 0.87 = 33.04 → 34
        assert_eq!(min_realistic_area(0, 0), 34.0);
        // (36 + 10 + 25) · 1.15 = 81.65，/ 0.87 = 93.85 → 94
        assert_eq!(min_realistic_area(3, 2), 94.0);
    }

    #[test]
    fn bathroom_ratio() {
        assert!(!bathroom_ratio_exceeded(1, 2));
        assert!(bathroom_ratio_exceeded(1, 3));
    }

    #[test]
    fn bathroom_ratio_saturates() {
        assert!(bathroom_ratio_exceeded(1, 3));
        assert!(!bathroom_ratio_exceeded(1, 2));
        assert!(!bathroom_ratio_exceeded(u32::MAX, u32::MAX));
    }
}
