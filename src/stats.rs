//! Build-stats marker for obfuscated assets.

use crate::compilation::AssetInfo;

pub const OBFUSCATED_STATS_FLAG: &str = "obfuscated";

/// The human-readable flag to render next to an asset in build stats, when
/// the asset carries the obfuscated marker.
pub fn obfuscated_stats_flag(info: &AssetInfo) -> Option<&'static str> {
    info.obfuscated.then_some(OBFUSCATED_STATS_FLAG)
}
