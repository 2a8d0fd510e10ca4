//! Memory-map accounting.
//!
//! A [`MemorySnapshot`] sums five residency/sharing categories across every
//! mapped region of the process. Regions come from `/proc/<pid>/smaps`, which
//! reports each region as a header line followed by `Field:   <n> kB` lines.

use crate::error::{Result, ViewMeterError};

/// Tracked memory-map categories, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryCategory {
    Rss,
    SharedClean,
    SharedDirty,
    PrivateClean,
    PrivateDirty,
}

impl MemoryCategory {
    pub const ALL: [MemoryCategory; 5] = [
        MemoryCategory::Rss,
        MemoryCategory::SharedClean,
        MemoryCategory::SharedDirty,
        MemoryCategory::PrivateClean,
        MemoryCategory::PrivateDirty,
    ];

    /// Name used in metric keys.
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryCategory::Rss => "rss",
            MemoryCategory::SharedClean => "shared_clean",
            MemoryCategory::SharedDirty => "shared_dirty",
            MemoryCategory::PrivateClean => "private_clean",
            MemoryCategory::PrivateDirty => "private_dirty",
        }
    }

    /// Field name as it appears in smaps.
    fn smaps_field(self) -> &'static str {
        match self {
            MemoryCategory::Rss => "Rss",
            MemoryCategory::SharedClean => "Shared_Clean",
            MemoryCategory::SharedDirty => "Shared_Dirty",
            MemoryCategory::PrivateClean => "Private_Clean",
            MemoryCategory::PrivateDirty => "Private_Dirty",
        }
    }

    fn from_smaps_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.smaps_field() == field)
    }
}

/// Byte counts for one mapped region (or a sum of regions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub rss: u64,
    pub shared_clean: u64,
    pub shared_dirty: u64,
    pub private_clean: u64,
    pub private_dirty: u64,
}

impl MemorySnapshot {
    pub fn get(&self, category: MemoryCategory) -> u64 {
        match category {
            MemoryCategory::Rss => self.rss,
            MemoryCategory::SharedClean => self.shared_clean,
            MemoryCategory::SharedDirty => self.shared_dirty,
            MemoryCategory::PrivateClean => self.private_clean,
            MemoryCategory::PrivateDirty => self.private_dirty,
        }
    }

    fn slot_mut(&mut self, category: MemoryCategory) -> &mut u64 {
        match category {
            MemoryCategory::Rss => &mut self.rss,
            MemoryCategory::SharedClean => &mut self.shared_clean,
            MemoryCategory::SharedDirty => &mut self.shared_dirty,
            MemoryCategory::PrivateClean => &mut self.private_clean,
            MemoryCategory::PrivateDirty => &mut self.private_dirty,
        }
    }

    /// Sum a sequence of regions into one snapshot.
    pub fn summed<'a, I>(regions: I) -> Self
    where
        I: IntoIterator<Item = &'a MappedRegion>,
    {
        regions.into_iter().fold(Self::default(), |mut acc, r| {
            for c in MemoryCategory::ALL {
                let slot = acc.slot_mut(c);
                *slot = slot.saturating_add(r.counts.get(c));
            }
            acc
        })
    }

    /// Signed per-category change from `before` to `self`.
    pub fn delta_since(&self, before: &MemorySnapshot) -> MemoryDelta {
        let d = |c| signed_diff(self.get(c), before.get(c));
        MemoryDelta {
            rss: d(MemoryCategory::Rss),
            shared_clean: d(MemoryCategory::SharedClean),
            shared_dirty: d(MemoryCategory::SharedDirty),
            private_clean: d(MemoryCategory::PrivateClean),
            private_dirty: d(MemoryCategory::PrivateDirty),
        }
    }
}

fn signed_diff(after: u64, before: u64) -> i64 {
    if after >= before {
        i64::try_from(after - before).unwrap_or(i64::MAX)
    } else {
        i64::try_from(before - after).map(|v| -v).unwrap_or(i64::MIN)
    }
}

/// Signed per-category difference between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryDelta {
    pub rss: i64,
    pub shared_clean: i64,
    pub shared_dirty: i64,
    pub private_clean: i64,
    pub private_dirty: i64,
}

impl MemoryDelta {
    pub fn get(&self, category: MemoryCategory) -> i64 {
        match category {
            MemoryCategory::Rss => self.rss,
            MemoryCategory::SharedClean => self.shared_clean,
            MemoryCategory::SharedDirty => self.shared_dirty,
            MemoryCategory::PrivateClean => self.private_clean,
            MemoryCategory::PrivateDirty => self.private_dirty,
        }
    }
}

/// One entry of the process memory map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRegion {
    /// Backing path or pseudo-name (`[heap]`, `[stack]`); empty for anonymous maps.
    pub path: String,
    pub counts: MemorySnapshot,
}

/// [`parse_smaps`] over raw file contents. Mapped paths need not be UTF-8;
/// invalid bytes are replaced.
pub fn parse_smaps_bytes(raw: &[u8]) -> Result<Vec<MappedRegion>> {
    parse_smaps(&String::from_utf8_lossy(raw))
}

/// Parse the text of an smaps file into regions. Values are converted from kB to bytes.
pub fn parse_smaps(text: &str) -> Result<Vec<MappedRegion>> {
    let mut regions: Vec<MappedRegion> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if is_region_header(line) {
            regions.push(MappedRegion {
                path: region_path(line).to_string(),
                counts: MemorySnapshot::default(),
            });
            continue;
        }

        let Some((field, rest)) = line.split_once(':') else {
            return Err(ViewMeterError::Parse(format!(
                "smaps line {}: expected `Field: value`",
                lineno + 1
            )));
        };
        let Some(category) = MemoryCategory::from_smaps_field(field) else {
            continue;
        };
        let Some(region) = regions.last_mut() else {
            return Err(ViewMeterError::Parse(format!(
                "smaps line {}: {field} before any region header",
                lineno + 1
            )));
        };
        *region.counts.slot_mut(category) = parse_kb(rest).ok_or_else(|| {
            ViewMeterError::Parse(format!("smaps line {}: bad value for {field}", lineno + 1))
        })?;
    }

    Ok(regions)
}

/// `00400000-0040b000 r-xp ...`
fn is_region_header(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .and_then(|range| range.split_once('-'))
        .is_some_and(|(lo, hi)| {
            u64::from_str_radix(lo, 16).is_ok() && u64::from_str_radix(hi, 16).is_ok()
        })
}

/// Everything after the five fixed header fields, spaces and ` (deleted)` included.
fn region_path(line: &str) -> &str {
    let mut rest = line;
    for _ in 0..5 {
        rest = rest.trim_start();
        match rest.split_once(char::is_whitespace) {
            Some((_, tail)) => rest = tail,
            None => return "",
        }
    }
    rest.trim()
}

fn parse_kb(value: &str) -> Option<u64> {
    let mut parts = value.split_whitespace();
    let n: u64 = parts.next()?.parse().ok()?;
    match parts.next() {
        Some("kB") | None => n.checked_mul(1024),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const SMAPS: &str = "\
55d0c8a00000-55d0c8a2b000 r--p 00000000 08:01 1311  /usr/bin/viewmeter
Size:                172 kB
Rss:                 168 kB
Pss:                 168 kB
Shared_Clean:          4 kB
Shared_Dirty:          0 kB
Private_Clean:       164 kB
Private_Dirty:         0 kB
VmFlags: rd mr mw me dw sd
55d0ca1f1000-55d0ca212000 rw-p 00000000 00:00 0      [heap]
Size:                132 kB
Rss:                  12 kB
Shared_Clean:          0 kB
Shared_Dirty:          0 kB
Private_Clean:         0 kB
Private_Dirty:        12 kB
THPeligible:    0
7f1c2a000000-7f1c2a021000 rw-p 00000000 00:00 0
Rss:                   8 kB
Shared_Dirty:          8 kB
";

    #[test]
    fn parses_regions_in_bytes() {
        let regions = parse_smaps(SMAPS).unwrap();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].path, "/usr/bin/viewmeter");
        assert_eq!(regions[0].counts.rss, 168 * 1024);
        assert_eq!(regions[0].counts.private_clean, 164 * 1024);
        assert_eq!(regions[1].path, "[heap]");
        assert_eq!(regions[1].counts.private_dirty, 12 * 1024);
        assert_eq!(regions[2].path, "");
        assert_eq!(regions[2].counts.shared_dirty, 8 * 1024);
    }

    #[test]
    fn sums_every_category_across_regions() {
        let regions = parse_smaps(SMAPS).unwrap();
        let total = MemorySnapshot::summed(&regions);
        assert_eq!(
            total,
            MemorySnapshot {
                rss: (168 + 12 + 8) * 1024,
                shared_clean: 4 * 1024,
                shared_dirty: 8 * 1024,
                private_clean: 164 * 1024,
                private_dirty: 12 * 1024,
            }
        );
    }

    #[test]
    fn empty_map_sums_to_zero() {
        let none: Vec<MappedRegion> = Vec::new();
        assert_eq!(MemorySnapshot::summed(&none), MemorySnapshot::default());
    }

    #[test]
    fn malformed_tracked_value_is_a_parse_error() {
        let bad = "00400000-00401000 r-xp 00000000 08:01 1 /bin/x\nRss: lots kB\n";
        let err = parse_smaps(bad).unwrap_err();
        assert_eq!(err.client_code(), crate::error::ClientCode::Parse);
    }

    #[test]
    fn non_utf8_path_keeps_counts() {
        let mut raw = b"7f00a0000000-7f00a0001000 r--s 00000000 08:01 42   /tmp/map_".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        raw.extend_from_slice(b"_file\nRss:                   4 kB\nShared_Clean:          4 kB\n");

        let regions = parse_smaps_bytes(&raw).unwrap();
        assert_eq!(regions.len(), 1);
        assert!(regions[0].path.starts_with("/tmp/map_"));
        assert_eq!(regions[0].counts.rss, 4096);
        assert_eq!(regions[0].counts.shared_clean, 4096);
    }

    #[test]
    fn path_keeps_spaces_and_deleted_suffix() {
        let text = "\
7f00a0000000-7f00a0001000 rw-s 00000000 00:05 77    /dev/shm/my cache (deleted)
Rss:                   8 kB
7f00a0002000-7f00a0003000 rw-p 00000000 00:00 0
Rss:                   4 kB
";
        let regions = parse_smaps(text).unwrap();
        assert_eq!(regions[0].path, "/dev/shm/my cache (deleted)");
        assert_eq!(regions[1].path, "");
    }

    #[test]
    fn field_before_header_is_rejected() {
        assert!(parse_smaps("Rss: 4 kB\n").is_err());
    }

    #[test]
    fn delta_can_shrink() {
        let before = MemorySnapshot { rss: 100, private_dirty: 40, ..Default::default() };
        let after = MemorySnapshot { rss: 150, private_dirty: 10, ..Default::default() };
        let d = after.delta_since(&before);
        assert_eq!(d.get(MemoryCategory::Rss), 50);
        assert_eq!(d.get(MemoryCategory::PrivateDirty), -30);
        assert_eq!(d.get(MemoryCategory::SharedClean), 0);
    }
}
