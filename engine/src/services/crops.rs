//! Crop phenology catalog
//!
//! Static guides for the crops grown around the platform's home region
//! (central Anatolia): thermal bounds for GDD, stage durations,
//! crop-coefficient curves and stress thresholds. Lookup is
//! alias-insensitive; Turkish crop names are first-class aliases.

use shared::models::PhenologyStage;

/// Thermal and water-stress profile of a crop
#[derive(Debug, Clone, PartialEq)]
pub struct CropGuide {
    pub name: &'static str,
    /// Lowercased lookup aliases, Turkish names included
    pub aliases: &'static [&'static str],
    /// GDD base temperature (°C)
    pub base_temp: f64,
    /// GDD upper cutoff (°C)
    pub upper_temp: f64,
    /// Stage durations in days: initial, development, mid, late
    pub stage_days: [u32; 4],
    /// Crop coefficient (Kc) per stage
    pub kc: [f64; 4],
    /// Hourly temperature at/above which an hour counts as heat stress (°C)
    pub heat_stress_temp: f64,
    /// Hourly temperature at/below which an hour counts as frost (°C)
    pub frost_temp: f64,
    /// Daily max VPD above which a stress note is raised (kPa)
    pub vpd_stress_kpa: f64,
    /// Cumulative-GDD milestones: emergence, flowering, maturity
    pub gdd_milestones: [(&'static str, f64); 3],
}

/// Crop coefficient applied when no stage can be resolved
pub const GENERIC_KC: f64 = 0.9;

/// Profile applied when the crop is unknown to the catalog
pub static DEFAULT_GUIDE: CropGuide = CropGuide {
    name: "generic",
    aliases: &[],
    base_temp: 0.0,
    upper_temp: 50.0,
    stage_days: [20, 30, 40, 30],
    kc: [GENERIC_KC, GENERIC_KC, GENERIC_KC, GENERIC_KC],
    heat_stress_temp: 35.0,
    frost_temp: 0.0,
    vpd_stress_kpa: 1.6,
    gdd_milestones: [
        ("emergence", 100.0),
        ("flowering", 800.0),
        ("maturity", 1500.0),
    ],
};

/// All known crop guides
pub static CROP_GUIDES: &[CropGuide] = &[
    CropGuide {
        name: "wheat",
        aliases: &["winter wheat", "buğday", "bugday"],
        base_temp: 0.0,
        upper_temp: 30.0,
        stage_days: [20, 50, 60, 30],
        kc: [0.3, 0.75, 1.15, 0.4],
        heat_stress_temp: 32.0,
        frost_temp: -4.0,
        vpd_stress_kpa: 1.6,
        gdd_milestones: [
            ("emergence", 120.0),
            ("flowering", 900.0),
            ("maturity", 1600.0),
        ],
    },
    CropGuide {
        name: "barley",
        aliases: &["arpa"],
        base_temp: 0.0,
        upper_temp: 30.0,
        stage_days: [15, 45, 55, 30],
        kc: [0.3, 0.75, 1.15, 0.25],
        heat_stress_temp: 30.0,
        frost_temp: -5.0,
        vpd_stress_kpa: 1.6,
        gdd_milestones: [
            ("emergence", 110.0),
            ("flowering", 850.0),
            ("maturity", 1500.0),
        ],
    },
    CropGuide {
        name: "maize",
        aliases: &["corn", "mısır", "misir"],
        base_temp: 10.0,
        upper_temp: 30.0,
        stage_days: [20, 35, 40, 30],
        kc: [0.3, 0.7, 1.2, 0.6],
        heat_stress_temp: 35.0,
        frost_temp: 0.0,
        vpd_stress_kpa: 2.0,
        gdd_milestones: [
            ("emergence", 60.0),
            ("flowering", 700.0),
            ("maturity", 1400.0),
        ],
    },
    CropGuide {
        name: "sunflower",
        aliases: &["ayçiçeği", "aycicegi"],
        base_temp: 7.0,
        upper_temp: 35.0,
        stage_days: [20, 35, 45, 25],
        kc: [0.35, 0.75, 1.1, 0.45],
        heat_stress_temp: 36.0,
        frost_temp: 0.0,
        vpd_stress_kpa: 2.0,
        gdd_milestones: [
            ("emergence", 70.0),
            ("flowering", 650.0),
            ("maturity", 1300.0),
        ],
    },
    CropGuide {
        name: "sugar beet",
        aliases: &["sugarbeet", "şeker pancarı", "seker pancari", "pancar"],
        base_temp: 3.0,
        upper_temp: 30.0,
        stage_days: [25, 35, 50, 50],
        kc: [0.35, 0.75, 1.2, 0.7],
        heat_stress_temp: 34.0,
        frost_temp: -2.0,
        vpd_stress_kpa: 1.8,
        gdd_milestones: [
            ("emergence", 90.0),
            ("flowering", 800.0),
            ("maturity", 2000.0),
        ],
    },
    CropGuide {
        name: "potato",
        aliases: &["patates"],
        base_temp: 7.0,
        upper_temp: 30.0,
        stage_days: [25, 30, 45, 30],
        kc: [0.5, 0.75, 1.15, 0.75],
        heat_stress_temp: 30.0,
        frost_temp: 0.0,
        vpd_stress_kpa: 1.5,
        gdd_milestones: [
            ("emergence", 80.0),
            ("flowering", 500.0),
            ("maturity", 1000.0),
        ],
    },
    CropGuide {
        name: "tomato",
        aliases: &["domates"],
        base_temp: 10.0,
        upper_temp: 35.0,
        stage_days: [30, 40, 45, 30],
        kc: [0.6, 0.85, 1.15, 0.8],
        heat_stress_temp: 35.0,
        frost_temp: 2.0,
        vpd_stress_kpa: 1.8,
        gdd_milestones: [
            ("emergence", 90.0),
            ("flowering", 550.0),
            ("maturity", 1300.0),
        ],
    },
    CropGuide {
        name: "chickpea",
        aliases: &["nohut"],
        base_temp: 5.0,
        upper_temp: 32.0,
        stage_days: [20, 30, 35, 25],
        kc: [0.4, 0.75, 1.0, 0.35],
        heat_stress_temp: 32.0,
        frost_temp: -1.0,
        vpd_stress_kpa: 1.7,
        gdd_milestones: [
            ("emergence", 85.0),
            ("flowering", 600.0),
            ("maturity", 1200.0),
        ],
    },
    CropGuide {
        name: "apple",
        aliases: &["elma"],
        base_temp: 4.0,
        upper_temp: 35.0,
        stage_days: [30, 50, 130, 40],
        kc: [0.45, 0.7, 0.95, 0.7],
        heat_stress_temp: 35.0,
        frost_temp: -2.0,
        vpd_stress_kpa: 2.2,
        gdd_milestones: [
            ("emergence", 100.0),
            ("flowering", 350.0),
            ("maturity", 2200.0),
        ],
    },
];

/// Find a guide by crop name or alias (trimmed, case-insensitive)
pub fn find_crop_guide(name: &str) -> Option<&'static CropGuide> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    CROP_GUIDES
        .iter()
        .find(|g| g.name == needle || g.aliases.iter().any(|a| *a == needle))
}

impl CropGuide {
    /// Resolve the phenology stage for a day count after planting.
    ///
    /// Negative day counts (planting date in the future) resolve to no
    /// stage; day counts past the last stage stay in `Late`.
    pub fn stage_for_day(&self, days_after_planting: i64) -> Option<PhenologyStage> {
        if days_after_planting < 0 {
            return None;
        }
        let day = days_after_planting as u64;
        let mut boundary = 0u64;
        for (stage, duration) in [
            PhenologyStage::Initial,
            PhenologyStage::Development,
            PhenologyStage::Mid,
            PhenologyStage::Late,
        ]
        .into_iter()
        .zip(self.stage_days)
        {
            boundary += u64::from(duration);
            if day < boundary {
                return Some(stage);
            }
        }
        Some(PhenologyStage::Late)
    }

    /// Crop coefficient for a stage
    pub fn kc_for_stage(&self, stage: PhenologyStage) -> f64 {
        match stage {
            PhenologyStage::Initial => self.kc[0],
            PhenologyStage::Development => self.kc[1],
            PhenologyStage::Mid => self.kc[2],
            PhenologyStage::Late => self.kc[3],
        }
    }
}
