use super::{
    Criticality, FinancialDefaults, IndustryConfig, PowerMethod, RateOverride, Recommendations,
    SubtypeConfig, TierMultipliers,
};
use std::collections::BTreeMap;

use Criticality::{Critical, Elevated, MissionCritical, Standard};
use PowerMethod::{PerArea, PerUnit};

struct Row {
    key: &'static str,
    label: &'static str,
    rate_watts: f64,
    storage_multiplier: f64,
    critical_load_fraction: f64,
    backup_hours: f64,
    criticality: Criticality,
}

const fn row(
    key: &'static str,
    label: &'static str,
    rate_watts: f64,
    storage_multiplier: f64,
    critical_load_fraction: f64,
    backup_hours: f64,
    criticality: Criticality,
) -> Row {
    Row {
        key,
        label,
        rate_watts,
        storage_multiplier,
        critical_load_fraction,
        backup_hours,
        criticality,
    }
}

struct IndustryRow {
    slug: &'static str,
    name: &'static str,
    method: PowerMethod,
    quantity_field: &'static str,
    load_factor: f64,
    default_subtype: &'static str,
    subtypes: &'static [Row],
    overrides: &'static [(&'static str, &'static str, Option<&'static str>, f64)],
    fields: &'static [&'static str],
    required: &'static [&'static str],
    financial: (f64, f64, f64),
    recommends: (bool, bool),
    tiers: (f64, f64, f64),
}

impl IndustryRow {
    fn build(&self) -> IndustryConfig {
        let subtypes: BTreeMap<String, SubtypeConfig> = self
            .subtypes
            .iter()
            .map(|row| {
                (
                    row.key.to_string(),
                    SubtypeConfig {
                        label: row.label.to_string(),
                        rate_watts: row.rate_watts,
                        storage_multiplier: row.storage_multiplier,
                        critical_load_fraction: row.critical_load_fraction,
                        backup_hours: row.backup_hours,
                        criticality: row.criticality,
                    },
                )
            })
            .collect();

        let rate_overrides = self
            .overrides
            .iter()
            .map(|(field, value, subtype, rate_watts)| RateOverride {
                field: field.to_string(),
                value: value.to_string(),
                subtype: subtype.map(str::to_string),
                rate_watts: *rate_watts,
            })
            .collect();

        let (peak_shaving_fraction, arbitrage_spread, grid_services_per_kw_year) = self.financial;
        let (solar, generator) = self.recommends;
        let (starter, standard, maximum) = self.tiers;

        IndustryConfig {
            slug: self.slug.to_string(),
            name: self.name.to_string(),
            power_method: self.method,
            quantity_field: self.quantity_field.to_string(),
            load_factor: self.load_factor,
            default_subtype: self.default_subtype.to_string(),
            subtypes,
            rate_overrides,
            fields: self.fields.iter().map(|field| field.to_string()).collect(),
            required_fields: self.required.iter().map(|field| field.to_string()).collect(),
            financial: FinancialDefaults {
                peak_shaving_fraction,
                arbitrage_spread,
                grid_services_per_kw_year,
            },
            recommendations: Recommendations { solar, generator },
            tiers: TierMultipliers {
                starter,
                standard,
                maximum,
            },
        }
    }
}

const DEFAULT_TIERS: (f64, f64, f64) = (0.6, 1.0, 1.4);

const INDUSTRIES: &[IndustryRow] = &[
    IndustryRow {
        slug: "hotel",
        name: "Hotel & Hospitality",
        method: PerUnit,
        quantity_field: "room_count",
        load_factor: 0.45,
        default_subtype: "midscale",
        subtypes: &[
            row("economy", "Economy / Limited Service", 3000.0, 0.40, 0.35, 4.0, Standard),
            row("midscale", "Midscale / Select Service", 4000.0, 0.40, 0.40, 4.0, Standard),
            row("upscale", "Upscale / Full Service", 5500.0, 0.50, 0.45, 4.0, Elevated),
            row("luxury", "Luxury", 7000.0, 0.55, 0.50, 4.0, Elevated),
        ],
        overrides: &[
            ("property_class", "resort", Some("luxury"), 8500.0),
            ("property_class", "resort", Some("upscale"), 6500.0),
        ],
        fields: &["room_count", "property_class", "occupancy_rate", "has_pool"],
        required: &["room_count"],
        financial: (0.25, 0.35, 0.0),
        recommends: (true, true),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "car_wash",
        name: "Car Wash",
        method: PerUnit,
        quantity_field: "bay_count",
        load_factor: 0.30,
        default_subtype: "express_tunnel",
        subtypes: &[
            row("self_service", "Self-Service Bays", 8000.0, 0.40, 0.20, 2.0, Standard),
            row("in_bay_automatic", "In-Bay Automatic", 35000.0, 0.45, 0.25, 2.0, Standard),
            row("express_tunnel", "Express Tunnel", 60000.0, 0.50, 0.30, 2.0, Standard),
            row("full_service", "Full-Service Tunnel", 75000.0, 0.50, 0.30, 2.0, Standard),
        ],
        overrides: &[("water_heating", "electric", None, 90000.0)],
        fields: &["bay_count", "water_heating", "daily_vehicles"],
        required: &["bay_count"],
        financial: (0.35, 0.30, 0.0),
        recommends: (true, false),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "data_center",
        name: "Data Center",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.85,
        default_subtype: "enterprise",
        subtypes: &[
            row("edge", "Edge / Micro Data Center", 120.0, 0.50, 0.90, 2.0, Critical),
            row("enterprise", "Enterprise", 150.0, 0.50, 0.90, 4.0, Critical),
            row("colocation", "Colocation", 200.0, 0.55, 0.95, 4.0, MissionCritical),
            row("hyperscale", "Hyperscale", 250.0, 0.55, 0.95, 4.0, MissionCritical),
        ],
        overrides: &[("uptime_tier", "tier_iv", None, 275.0)],
        fields: &["uptime_tier", "rack_count"],
        required: &["square_footage"],
        financial: (0.20, 0.25, 40.0),
        recommends: (false, true),
        tiers: (0.7, 1.0, 1.5),
    },
    IndustryRow {
        slug: "hospital",
        name: "Hospital & Healthcare",
        method: PerUnit,
        quantity_field: "bed_count",
        load_factor: 0.65,
        default_subtype: "community",
        subtypes: &[
            row("critical_access", "Critical Access Hospital", 9000.0, 0.50, 0.70, 4.0, MissionCritical),
            row("community", "Community Hospital", 10000.0, 0.50, 0.60, 4.0, Critical),
            row("regional_medical_center", "Regional Medical Center", 12000.0, 0.55, 0.65, 4.0, MissionCritical),
            row("specialty", "Specialty / Surgical", 8000.0, 0.45, 0.50, 4.0, Critical),
        ],
        overrides: &[("trauma_level", "level_1", Some("regional_medical_center"), 14000.0)],
        fields: &["bed_count", "trauma_level", "operating_rooms"],
        required: &["bed_count"],
        financial: (0.20, 0.25, 30.0),
        recommends: (true, true),
        tiers: (0.7, 1.0, 1.4),
    },
    IndustryRow {
        slug: "warehouse",
        name: "Warehouse & Logistics",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.40,
        default_subtype: "distribution_center",
        subtypes: &[
            row("dry_storage", "Dry Storage", 1.5, 0.40, 0.20, 4.0, Standard),
            row("distribution_center", "Distribution Center", 3.0, 0.40, 0.25, 4.0, Standard),
            row("fulfillment", "E-Commerce Fulfillment", 4.5, 0.45, 0.30, 4.0, Elevated),
        ],
        overrides: &[("automation_level", "high", None, 6.0)],
        fields: &["automation_level", "dock_doors"],
        required: &["square_footage"],
        financial: (0.30, 0.30, 0.0),
        recommends: (true, false),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "cold_storage",
        name: "Cold Storage",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.70,
        default_subtype: "freezer",
        subtypes: &[
            row("cooler", "Cooler (Above Freezing)", 8.0, 0.45, 0.60, 4.0, Elevated),
            row("freezer", "Freezer", 12.0, 0.50, 0.60, 4.0, Critical),
            row("blast_freezer", "Blast Freezer", 18.0, 0.50, 0.70, 4.0, Critical),
        ],
        overrides: &[],
        fields: &["temperature_zones"],
        required: &["square_footage"],
        financial: (0.25, 0.30, 20.0),
        recommends: (true, true),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "office",
        name: "Office Building",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.35,
        default_subtype: "class_b",
        subtypes: &[
            row("class_a", "Class A Office", 6.0, 0.40, 0.25, 4.0, Standard),
            row("class_b", "Class B Office", 5.0, 0.40, 0.25, 4.0, Standard),
            row("class_c", "Class C Office", 4.0, 0.40, 0.20, 4.0, Standard),
            row("medical_office", "Medical Office", 7.0, 0.45, 0.40, 4.0, Elevated),
        ],
        overrides: &[],
        fields: &["floors"],
        required: &["square_footage"],
        financial: (0.30, 0.30, 0.0),
        recommends: (true, false),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "retail",
        name: "Retail",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.40,
        default_subtype: "big_box",
        subtypes: &[
            row("strip_center", "Strip Center", 4.0, 0.40, 0.20, 4.0, Standard),
            row("big_box", "Big Box Store", 5.0, 0.40, 0.25, 4.0, Standard),
            row("shopping_mall", "Shopping Mall", 6.0, 0.40, 0.25, 4.0, Standard),
            row("grocery", "Grocery / Supermarket", 12.0, 0.45, 0.50, 4.0, Elevated),
        ],
        overrides: &[],
        fields: &["refrigerated_cases"],
        required: &["square_footage"],
        financial: (0.30, 0.30, 0.0),
        recommends: (true, false),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "manufacturing",
        name: "Manufacturing",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.60,
        default_subtype: "light_assembly",
        subtypes: &[
            row("light_assembly", "Light Assembly", 10.0, 0.45, 0.30, 4.0, Standard),
            row("food_processing", "Food & Beverage Processing", 15.0, 0.45, 0.50, 4.0, Elevated),
            row("electronics", "Electronics / Semiconductor", 20.0, 0.50, 0.70, 4.0, Critical),
            row("heavy_industrial", "Heavy Industrial", 25.0, 0.50, 0.40, 4.0, Elevated),
        ],
        overrides: &[("shift_pattern", "three_shift", None, 28.0)],
        fields: &["shift_pattern", "production_lines"],
        required: &["square_footage"],
        financial: (0.25, 0.25, 25.0),
        recommends: (true, true),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "apartment",
        name: "Apartment & Multifamily",
        method: PerUnit,
        quantity_field: "unit_count",
        load_factor: 0.40,
        default_subtype: "mid_rise",
        subtypes: &[
            row("garden", "Garden Style", 2500.0, 0.40, 0.20, 4.0, Standard),
            row("mid_rise", "Mid-Rise", 3000.0, 0.40, 0.25, 4.0, Standard),
            row("high_rise", "High-Rise", 3500.0, 0.45, 0.30, 4.0, Elevated),
            row("senior_living", "Senior Living", 4000.0, 0.50, 0.50, 4.0, Critical),
        ],
        overrides: &[],
        fields: &["unit_count", "floors"],
        required: &["unit_count"],
        financial: (0.25, 0.30, 0.0),
        recommends: (true, false),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "college",
        name: "College & University",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.45,
        default_subtype: "university_campus",
        subtypes: &[
            row("community_college", "Community College", 5.0, 0.40, 0.25, 4.0, Standard),
            row("university_campus", "University Campus", 7.0, 0.45, 0.30, 4.0, Elevated),
            row("research_university", "Research University", 10.0, 0.50, 0.45, 4.0, Critical),
        ],
        overrides: &[],
        fields: &["student_count", "residence_halls"],
        required: &["square_footage"],
        financial: (0.25, 0.30, 20.0),
        recommends: (true, true),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "restaurant",
        name: "Restaurant",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.35,
        default_subtype: "casual_dining",
        subtypes: &[
            row("quick_service", "Quick Service", 35.0, 0.40, 0.30, 2.0, Standard),
            row("casual_dining", "Casual Dining", 25.0, 0.40, 0.25, 2.0, Standard),
            row("fine_dining", "Fine Dining", 20.0, 0.40, 0.25, 2.0, Standard),
        ],
        overrides: &[("kitchen_type", "all_electric", None, 45.0)],
        fields: &["kitchen_type", "seats"],
        required: &["square_footage"],
        financial: (0.30, 0.30, 0.0),
        recommends: (true, false),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "casino",
        name: "Casino & Gaming",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.70,
        default_subtype: "regional",
        subtypes: &[
            row("regional", "Regional Casino", 15.0, 0.45, 0.50, 4.0, Elevated),
            row("destination_resort", "Destination Resort", 20.0, 0.50, 0.60, 4.0, Critical),
        ],
        overrides: &[],
        fields: &["gaming_floor_sqft", "hotel_rooms"],
        required: &["square_footage"],
        financial: (0.25, 0.30, 0.0),
        recommends: (true, true),
        tiers: DEFAULT_TIERS,
    },
    IndustryRow {
        slug: "agriculture",
        name: "Agriculture & Indoor Farming",
        method: PerArea,
        quantity_field: "square_footage",
        load_factor: 0.55,
        default_subtype: "greenhouse",
        subtypes: &[
            row("greenhouse", "Greenhouse", 8.0, 0.40, 0.30, 4.0, Standard),
            row("indoor_farm", "Indoor Vertical Farm", 35.0, 0.50, 0.50, 4.0, Elevated),
            row("dairy", "Dairy Operation", 3.0, 0.40, 0.50, 4.0, Elevated),
        ],
        overrides: &[],
        fields: &["irrigation_pumps"],
        required: &["square_footage"],
        financial: (0.25, 0.30, 0.0),
        recommends: (true, true),
        tiers: DEFAULT_TIERS,
    },
];

pub(super) fn builtin() -> Vec<IndustryConfig> {
    INDUSTRIES.iter().map(IndustryRow::build).collect()
}
