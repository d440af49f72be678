//! Filament materials.

use serde::{Deserialize, Serialize};

/// Density used for names outside the table, g/cm³.
pub const FALLBACK_DENSITY: f64 = 1.2;
/// Reference price used for names outside the table, per kg.
pub const FALLBACK_PRICE_PER_KG: f64 = 25.0;

/// Known filament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Material {
    /// Bambu PLA Basic.
    #[default]
    #[serde(rename = "PLA Basic")]
    PlaBasic,
    /// Impact-resistant PLA.
    #[serde(rename = "PLA Tough")]
    PlaTough,
    /// PETG Basic.
    #[serde(rename = "PETG Basic")]
    PetgBasic,
    /// ABS.
    #[serde(rename = "ABS")]
    Abs,
    /// ASA.
    #[serde(rename = "ASA")]
    Asa,
    /// Polycarbonate.
    #[serde(rename = "PC")]
    Pc,
    /// Nylon.
    #[serde(rename = "PA (Nylon)")]
    Nylon,
    /// Flexible TPU, shore 95A.
    #[serde(rename = "TPU 95A")]
    Tpu95A,
}

impl Material {
    /// Every known material, in display order.
    pub const ALL: [Material; 8] = [
        Material::PlaBasic,
        Material::PlaTough,
        Material::PetgBasic,
        Material::Abs,
        Material::Asa,
        Material::Pc,
        Material::Nylon,
        Material::Tpu95A,
    ];

    /// The name the upload form uses.
    pub fn name(&self) -> &'static str {
        match self {
            Material::PlaBasic => "PLA Basic",
            Material::PlaTough => "PLA Tough",
            Material::PetgBasic => "PETG Basic",
            Material::Abs => "ABS",
            Material::Asa => "ASA",
            Material::Pc => "PC",
            Material::Nylon => "PA (Nylon)",
            Material::Tpu95A => "TPU 95A",
        }
    }

    /// Density in g/cm³.
    pub fn density(&self) -> f64 {
        match self {
            Material::PlaBasic | Material::PlaTough => 1.24,
            Material::PetgBasic => 1.27,
            Material::Abs => 1.05,
            Material::Asa => 1.07,
            Material::Pc => 1.20,
            Material::Nylon => 1.14,
            Material::Tpu95A => 1.21,
        }
    }

    /// Reference filament price per kg.
    pub fn price_per_kg(&self) -> f64 {
        match self {
            Material::PlaBasic => 20.0,
            Material::PetgBasic => 25.0,
            Material::PlaTough | Material::Abs | Material::Asa => 26.0,
            Material::Pc | Material::Tpu95A => 30.0,
            Material::Nylon => 40.0,
        }
    }

    /// Exact-name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

/// Material name with the physical constants pricing needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialProfile {
    /// Name as requested; unknown names are echoed unchanged.
    pub name: String,
    /// The matched table entry, if any.
    pub material: Option<Material>,
    /// g/cm³.
    pub density: f64,
    /// Reference price per kg.
    pub price_per_kg: f64,
}

impl MaterialProfile {
    /// Profile for `name`, falling back to generic constants.
    pub fn for_name(name: &str) -> Self {
        match Material::from_name(name) {
            Some(material) => material.into(),
            None => Self {
                name: name.to_string(),
                material: None,
                density: FALLBACK_DENSITY,
                price_per_kg: FALLBACK_PRICE_PER_KG,
            },
        }
    }
}

impl From<Material> for MaterialProfile {
    fn from(material: Material) -> Self {
        Self {
            name: material.name().to_string(),
            material: Some(material),
            density: material.density(),
            price_per_kg: material.price_per_kg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table() {
        let table: Vec<(&str, f64, f64)> = Material::ALL
            .iter()
            .map(|m| (m.name(), m.density(), m.price_per_kg()))
            .collect();
        assert_eq!(
            table,
            vec![
                ("PLA Basic", 1.24, 20.0),
                ("PLA Tough", 1.24, 26.0),
                ("PETG Basic", 1.27, 25.0),
                ("ABS", 1.05, 26.0),
                ("ASA", 1.07, 26.0),
                ("PC", 1.20, 30.0),
                ("PA (Nylon)", 1.14, 40.0),
                ("TPU 95A", 1.21, 30.0),
            ]
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(Material::from_name("ABS"), Some(Material::Abs));
        assert_eq!(Material::from_name("abs"), None);
        assert_eq!(Material::from_name(" PLA Basic"), None);
    }

    #[test]
    fn test_unknown_material_falls_back() {
        let p = MaterialProfile::for_name("Carbon PEEK");
        assert_eq!(p.name, "Carbon PEEK");
        assert_eq!(p.material, None);
        assert_eq!(p.density, 1.2);
        assert_eq!(p.price_per_kg, 25.0);
    }

    #[test]
    fn test_serde_names_match_form_names() {
        for m in Material::ALL {
            let json = serde_json::to_string(&m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.name()));
            let back: Material = serde_json::from_str(&json).unwrap();
            assert_eq!(back, m);
        }
        assert_eq!(Material::default(), Material::PlaBasic);
    }
}
