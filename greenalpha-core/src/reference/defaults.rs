//! Built-in reference tables (IPCC 2021 guidelines and industry sources).

use greenalpha_schemas::{
    country::CountryCentroid,
    factor::{CountryGridFactor, EmissionFactor, GridFactor, NamedEmissionFactor},
    market::{CarbonMarket, CarbonPrice, Liquidity, RegionMembership},
    product::{CatalogProduct, ProductionProfile},
    transport::{TransportFactor, TransportMode},
};

pub const GENERIC_PRODUCT: &str = "generic_electronics";
pub const GLOBAL_GRID_FACTOR: &str = "grid_electricity_global";

pub fn emission_factors() -> Vec<NamedEmissionFactor> {
    let rows: [(&str, f64, &str, &str, f64); 12] = [
        ("grid_electricity_global", 0.475, "kg CO2e/kWh", "IEA", 10.0),
        ("natural_gas", 0.202, "kg CO2e/kWh", "IPCC", 5.0),
        ("coal", 0.820, "kg CO2e/kWh", "IPCC", 8.0),
        ("renewable", 0.041, "kg CO2e/kWh", "IPCC", 15.0),
        ("steel", 2.3, "kg CO2e/kg", "WorldSteel", 12.0),
        ("aluminum", 11.5, "kg CO2e/kg", "IAI", 15.0),
        ("concrete", 0.5, "kg CO2e/kg", "GCCA", 20.0),
        ("plastic_pet", 2.2, "kg CO2e/kg", "PlasticsEurope", 18.0),
        ("paper", 0.9, "kg CO2e/kg", "CEPI", 10.0),
        ("diesel", 2.68, "kg CO2e/L", "IPCC", 3.0),
        ("gasoline", 2.31, "kg CO2e/L", "IPCC", 3.0),
        ("jet_fuel", 2.52, "kg CO2e/L", "IPCC", 5.0),
    ];
    rows.iter()
        .map(|&(name, value, unit, source, uncertainty)| NamedEmissionFactor {
            name: name.to_string(),
            factor: EmissionFactor::new(value, unit, source, 2021, uncertainty),
        })
        .collect()
}

pub fn transport_factors() -> Vec<TransportFactor> {
    let rows = [
        (TransportMode::Road, 0.062, "IPCC", 20.0, 1.0, "Heavy goods vehicle"),
        (TransportMode::Rail, 0.022, "IPCC", 15.0, 0.8, "Freight rail"),
        (TransportMode::Sea, 0.014, "IMO", 25.0, 0.6, "Container shipping"),
        (TransportMode::Air, 0.602, "ICAO", 30.0, 1.5, "Air freight"),
        (TransportMode::Pipeline, 0.005, "IPCC", 10.0, 0.7, "Pipeline transport"),
    ];
    rows.iter()
        .map(|&(mode, value, source, uncertainty, adjustment, description)| TransportFactor {
            mode,
            factor: EmissionFactor::new(value, "kg CO2e/tonne-km", source, 2021, uncertainty),
            adjustment,
            description: description.to_string(),
        })
        .collect()
}

pub fn grid_factors() -> Vec<CountryGridFactor> {
    [
        ("USA", 0.385, 1.0),
        ("CHN", 0.644, 1.2),
        ("DEU", 0.338, 0.9),
        ("JPN", 0.462, 1.0),
        ("IND", 0.708, 1.3),
        ("BRA", 0.098, 0.7),
        ("CAN", 0.110, 0.8),
    ]
    .iter()
    .map(|&(code, electricity, energy_mix_factor)| CountryGridFactor {
        country_code: code.to_string(),
        grid: GridFactor {
            electricity,
            energy_mix_factor,
        },
    })
    .collect()
}

fn product(
    name: &str,
    energy_intensity: f64,
    materials: &[(&str, f64)],
    water_usage: f64,
    waste_generation: f64,
    unit_weight_kg: f64,
) -> CatalogProduct {
    CatalogProduct {
        product_name: name.to_string(),
        unit_weight_kg,
        profile: ProductionProfile {
            energy_intensity,
            material_footprint: materials.iter().map(|&(m, kg)| (m.to_string(), kg)).collect(),
            water_usage,
            waste_generation,
        },
    }
}

pub fn products() -> Vec<CatalogProduct> {
    vec![
        product(
            "smartphone",
            85.0,
            &[("steel", 0.025), ("aluminum", 0.015), ("plastic_pet", 0.08)],
            12000.0,
            0.5,
            0.2,
        ),
        product(
            "laptop",
            450.0,
            &[("steel", 0.15), ("aluminum", 0.8), ("plastic_pet", 0.3)],
            45000.0,
            2.1,
            2.5,
        ),
        product("t_shirt_cotton", 12.0, &[("organic_cotton", 0.5)], 2700.0, 0.1, 0.15),
        product(
            "running_shoes",
            35.0,
            &[("plastic_pet", 0.2), ("rubber", 0.15)],
            8000.0,
            0.3,
            0.8,
        ),
        product("coffee_1kg", 8.5, &[("packaging", 0.05)], 18900.0, 0.2, 1.0),
        generic_product(),
    ]
}

pub fn generic_product() -> CatalogProduct {
    product(
        GENERIC_PRODUCT,
        200.0,
        &[("steel", 0.1), ("aluminum", 0.05), ("plastic_pet", 0.15)],
        25000.0,
        1.0,
        1.0,
    )
}

pub fn centroids() -> Vec<CountryCentroid> {
    [
        ("USA", 39.8283, -98.5795),
        ("CHN", 35.8617, 104.1954),
        ("DEU", 51.1657, 10.4515),
        ("JPN", 36.2048, 138.2529),
        ("IND", 20.5937, 78.9629),
        ("BRA", -14.2350, -51.9253),
        ("CAN", 56.1304, -106.3468),
        ("GBR", 55.3781, -3.4360),
        ("FRA", 46.6034, 2.2137),
        ("ITA", 41.8719, 12.5674),
        ("AUS", -25.2744, 133.7751),
        ("RUS", 61.5240, 105.3188),
        ("MEX", 23.6345, -102.5528),
        ("KOR", 35.9078, 127.7669),
        ("ESP", 40.4637, -3.7492),
    ]
    .iter()
    .map(|&(code, latitude, longitude)| CountryCentroid {
        country_code: code.to_string(),
        latitude,
        longitude,
    })
    .collect()
}

pub fn carbon_prices() -> Vec<CarbonPrice> {
    [
        ("EU_ETS", 85.50),
        ("RGGI", 13.25),
        ("WCI", 28.75),
        ("CORSIA", 22.00),
        ("VOLUNTARY", 15.00),
        ("SOCIAL_COST", 51.00),
    ]
    .iter()
    .map(|&(code, price)| CarbonPrice {
        market_code: code.to_string(),
        price_per_tonne: price,
    })
    .collect()
}

pub fn markets() -> Vec<CarbonMarket> {
    vec![
        CarbonMarket {
            market: "EU ETS".to_string(),
            price_per_tonne: 85.50,
            liquidity: Liquidity::High,
            eligibility: vec!["EU".to_string(), "EEA".to_string()],
            requirements: "Installation permit required".to_string(),
        },
        CarbonMarket {
            market: "Voluntary Carbon Market".to_string(),
            price_per_tonne: 15.00,
            liquidity: Liquidity::Medium,
            eligibility: vec!["global".to_string()],
            requirements: "Third-party verification".to_string(),
        },
        CarbonMarket {
            market: "RGGI".to_string(),
            price_per_tonne: 13.25,
            liquidity: Liquidity::Medium,
            eligibility: vec!["US_Northeast".to_string()],
            requirements: "Power sector participation".to_string(),
        },
    ]
}

const EU_MEMBERS: [&str; 27] = [
    "AUT", "BEL", "BGR", "HRV", "CYP", "CZE", "DNK", "EST", "FIN", "FRA", "DEU", "GRC", "HUN",
    "IRL", "ITA", "LVA", "LTU", "LUX", "MLT", "NLD", "POL", "PRT", "ROU", "SVK", "SVN", "ESP",
    "SWE",
];

pub fn regions() -> Vec<RegionMembership> {
    let eu: Vec<String> = EU_MEMBERS.iter().map(|c| c.to_string()).collect();
    let mut eea = eu.clone();
    eea.extend(["NOR", "ISL", "LIE"].iter().map(|c| c.to_string()));

    vec![
        RegionMembership {
            region: "EU".to_string(),
            members: eu,
        },
        RegionMembership {
            region: "EEA".to_string(),
            members: eea,
        },
        RegionMembership {
            region: "US_Northeast".to_string(),
            members: vec!["USA".to_string()],
        },
    ]
}
