use super::MappingConfig;
use std::collections::BTreeMap;

/// Aliases used by the questionnaire for the questions every industry shares.
const UNIVERSAL_FIELDS: &[(&str, &[&str])] = &[
    (
        "square_footage",
        &["facilitySize", "squareFootage", "squareFeet", "sqft", "buildingSize", "totalSqFt"],
    ),
    ("operating_hours", &["operatingHours", "hoursPerDay", "dailyOperatingHours"]),
    ("peak_load_mw", &["peakLoad", "peakDemandMW", "knownPeakLoad"]),
    ("grid_connection", &["gridConnection", "utilityRateType", "gridQuality"]),
    ("grid_capacity_mw", &["gridCapacity", "gridCapacityMW", "serviceCapacity"]),
    ("backup_hours", &["backupHours", "backupDuration", "outageDuration"]),
    ("wants_solar", &["wantsSolar", "solarInterest", "includeSolar", "hasSolarInterest"]),
    ("wants_generator", &["wantsGenerator", "includeGenerator", "backupGenerator"]),
    ("level2_chargers", &["level2Chargers", "l2Chargers", "evL2Count"]),
    ("dcfc_chargers", &["dcfcChargers", "dcFastChargers", "dcfcCount"]),
    ("hpc_chargers", &["hpcChargers", "ultraFastChargers", "hpcCount"]),
    ("electricity_rate", &["electricityRate", "utilityRate", "energyRate"]),
    ("demand_charge", &["demandCharge", "demandRate", "demandChargePerKw"]),
];

struct IndustryTable {
    slug: &'static str,
    fields: &'static [(&'static str, &'static [&'static str])],
    subtypes: &'static [(&'static str, &'static [&'static str])],
    default_subtype: &'static str,
}

const INDUSTRY_TABLES: &[IndustryTable] = &[
    IndustryTable {
        slug: "hotel",
        fields: &[
            ("room_count", &["roomCount", "numberOfRooms", "numRooms", "rooms", "hotelRooms", "guestRooms"]),
            ("subtype", &["hotelType", "hotelClass", "hotelCategory", "propertyType", "hotelClassification"]),
            ("property_class", &["propertyClass", "resortType"]),
            ("occupancy_rate", &["occupancyRate", "avgOccupancy"]),
            ("has_pool", &["hasPool", "poolOnSite"]),
        ],
        subtypes: &[
            ("economy", &["budget", "limited-service", "extended-stay-economy"]),
            ("midscale", &["mid-scale", "select-service", "upper-midscale"]),
            ("upscale", &["upper-upscale", "full-service", "boutique"]),
            ("luxury", &["luxury-resort", "five-star"]),
        ],
        default_subtype: "midscale",
    },
    IndustryTable {
        slug: "car_wash",
        fields: &[
            ("bay_count", &["bayCount", "numBays", "washBays", "numberOfBays"]),
            ("subtype", &["washType", "carWashType", "serviceType", "facilityType"]),
            ("water_heating", &["waterHeating", "waterHeaterType"]),
            ("daily_vehicles", &["dailyVehicles", "carsPerDay", "vehiclesPerDay"]),
        ],
        subtypes: &[
            ("self_service", &["self-serve", "selfserve", "coin-op"]),
            ("in_bay_automatic", &["in-bay", "iba", "rollover", "touchless"]),
            ("express_tunnel", &["express", "tunnel", "express-exterior"]),
            ("full_service", &["full-service", "flex-serve", "flex"]),
        ],
        default_subtype: "express_tunnel",
    },
    IndustryTable {
        slug: "data_center",
        fields: &[
            ("subtype", &["dataCenterType", "facilityType", "dcType"]),
            ("uptime_tier", &["uptimeTier", "tierClassification", "tier"]),
            ("rack_count", &["rackCount", "numberOfRacks", "racks"]),
        ],
        subtypes: &[
            ("edge", &["micro", "edge-site"]),
            ("enterprise", &["corporate", "on-premise", "private"]),
            ("colocation", &["colo", "multi-tenant"]),
            ("hyperscale", &["cloud", "hyperscaler"]),
        ],
        default_subtype: "enterprise",
    },
    IndustryTable {
        slug: "hospital",
        fields: &[
            ("bed_count", &["bedCount", "numberOfBeds", "beds", "licensedBeds"]),
            ("subtype", &["hospitalType", "facilityType", "careLevel"]),
            ("trauma_level", &["traumaLevel", "traumaCenter"]),
            ("operating_rooms", &["operatingRooms", "orCount"]),
        ],
        subtypes: &[
            ("critical_access", &["cah", "critical-access-hospital", "rural"]),
            ("community", &["general", "acute-care", "community-hospital"]),
            ("regional_medical_center", &["regional", "medical-center", "academic", "teaching"]),
            ("specialty", &["surgical", "ambulatory-surgery", "rehabilitation"]),
        ],
        default_subtype: "community",
    },
    IndustryTable {
        slug: "warehouse",
        fields: &[
            ("subtype", &["warehouseType", "facilityType", "operationType"]),
            ("automation_level", &["automationLevel", "automation"]),
            ("dock_doors", &["dockDoors", "loadingDocks"]),
        ],
        subtypes: &[
            ("dry_storage", &["dry", "storage", "general-storage"]),
            ("distribution_center", &["distribution", "dc", "logistics", "cross-dock"]),
            ("fulfillment", &["e-commerce", "ecommerce", "fulfillment-center"]),
        ],
        default_subtype: "distribution_center",
    },
    IndustryTable {
        slug: "cold_storage",
        fields: &[
            ("subtype", &["storageType", "coldStorageType", "facilityType"]),
            ("temperature_zones", &["temperatureZones", "tempZones"]),
        ],
        subtypes: &[
            ("cooler", &["refrigerated", "chilled"]),
            ("freezer", &["frozen", "deep-freeze"]),
            ("blast_freezer", &["blast", "flash-freeze"]),
        ],
        default_subtype: "freezer",
    },
    IndustryTable {
        slug: "office",
        fields: &[
            ("subtype", &["officeClass", "buildingClass", "officeType"]),
            ("floors", &["numFloors", "stories", "floorCount"]),
        ],
        subtypes: &[
            ("class_a", &["a", "trophy"]),
            ("class_b", &["b"]),
            ("class_c", &["c"]),
            ("medical_office", &["medical", "mob"]),
        ],
        default_subtype: "class_b",
    },
    IndustryTable {
        slug: "retail",
        fields: &[
            ("subtype", &["retailType", "storeType", "facilityType"]),
            ("refrigerated_cases", &["refrigeratedCases", "coolerCases"]),
        ],
        subtypes: &[
            ("strip_center", &["strip", "strip-mall"]),
            ("big_box", &["bigbox", "department-store", "warehouse-club"]),
            ("shopping_mall", &["mall", "shopping-center"]),
            ("grocery", &["supermarket", "grocery-store"]),
        ],
        default_subtype: "big_box",
    },
    IndustryTable {
        slug: "manufacturing",
        fields: &[
            ("subtype", &["manufacturingType", "industryType", "facilityType"]),
            ("shift_pattern", &["shiftPattern", "shifts"]),
            ("production_lines", &["productionLines", "lineCount"]),
        ],
        subtypes: &[
            ("light_assembly", &["light", "assembly", "light-manufacturing"]),
            ("food_processing", &["food", "beverage", "food-and-beverage"]),
            ("electronics", &["semiconductor", "cleanroom"]),
            ("heavy_industrial", &["heavy", "heavy-industry", "metals"]),
        ],
        default_subtype: "light_assembly",
    },
    IndustryTable {
        slug: "apartment",
        fields: &[
            ("unit_count", &["unitCount", "numberOfUnits", "numUnits", "apartmentUnits", "units"]),
            ("subtype", &["buildingType", "apartmentType", "propertyType"]),
            ("floors", &["stories", "numFloors"]),
        ],
        subtypes: &[
            ("garden", &["garden-style", "walk-up"]),
            ("mid_rise", &["midrise"]),
            ("high_rise", &["highrise", "tower"]),
            ("senior_living", &["senior", "assisted-living", "independent-living"]),
        ],
        default_subtype: "mid_rise",
    },
    IndustryTable {
        slug: "college",
        fields: &[
            ("subtype", &["campusType", "institutionType", "schoolType"]),
            ("student_count", &["studentCount", "enrollment"]),
            ("residence_halls", &["residenceHalls", "dorms"]),
        ],
        subtypes: &[
            ("community_college", &["two-year", "junior-college"]),
            ("university_campus", &["university", "four-year", "campus"]),
            ("research_university", &["research", "r1"]),
        ],
        default_subtype: "university_campus",
    },
    IndustryTable {
        slug: "restaurant",
        fields: &[
            ("subtype", &["restaurantType", "serviceStyle", "diningType"]),
            ("kitchen_type", &["kitchenType", "cookingFuel"]),
            ("seats", &["seatCount", "seatingCapacity"]),
        ],
        subtypes: &[
            ("quick_service", &["qsr", "fast-food", "fast-casual"]),
            ("casual_dining", &["casual", "family"]),
            ("fine_dining", &["fine", "upscale-dining"]),
        ],
        default_subtype: "casual_dining",
    },
    IndustryTable {
        slug: "casino",
        fields: &[
            ("subtype", &["casinoType", "facilityType"]),
            ("gaming_floor_sqft", &["gamingFloorSqft", "gamingSpace"]),
            ("hotel_rooms", &["hotelRooms", "roomCount"]),
        ],
        subtypes: &[
            ("regional", &["local", "tribal", "racino"]),
            ("destination_resort", &["resort", "destination", "integrated-resort"]),
        ],
        default_subtype: "regional",
    },
    IndustryTable {
        slug: "agriculture",
        fields: &[
            ("subtype", &["farmType", "operationType", "facilityType"]),
            ("irrigation_pumps", &["irrigationPumps", "pumpCount"]),
        ],
        subtypes: &[
            ("greenhouse", &["glasshouse", "hoop-house"]),
            ("indoor_farm", &["vertical", "indoor", "vertical-farm", "cea"]),
            ("dairy", &["livestock", "milking"]),
        ],
        default_subtype: "greenhouse",
    },
];

fn invert(table: &[(&str, &[&str])]) -> BTreeMap<String, String> {
    table
        .iter()
        .flat_map(|(canonical, aliases)| {
            aliases
                .iter()
                .map(move |alias| (alias.to_string(), canonical.to_string()))
        })
        .collect()
}

pub(super) fn universal_fields() -> BTreeMap<String, String> {
    invert(UNIVERSAL_FIELDS)
}

pub(super) fn industry_mappings() -> BTreeMap<String, MappingConfig> {
    INDUSTRY_TABLES
        .iter()
        .map(|table| {
            (
                table.slug.to_string(),
                MappingConfig {
                    fields: invert(table.fields),
                    subtypes: invert(table.subtypes),
                    default_subtype: table.default_subtype.to_string(),
                },
            )
        })
        .collect()
}
