use serde::Serialize;

/// Business categories with a dedicated reporting view in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Salon,
    Cafe,
    Restaurant,
    Retail,
    Pharmacy,
}

/// Raised when a request names a category outside the fixed view table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid business type.")]
pub struct InvalidBusinessType {
    pub token: String,
}

impl BusinessType {
    pub const ALL: [BusinessType; 5] = [
        BusinessType::Salon,
        BusinessType::Cafe,
        BusinessType::Restaurant,
        BusinessType::Retail,
        BusinessType::Pharmacy,
    ];

    /// Case-insensitive lookup of a request token such as `salon` or `Cafe`.
    pub fn resolve(token: &str) -> Result<Self, InvalidBusinessType> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| InvalidBusinessType {
                token: token.to_string(),
            })
    }

    pub fn token(self) -> &'static str {
        match self {
            BusinessType::Salon => "salon",
            BusinessType::Cafe => "cafe",
            BusinessType::Restaurant => "restaurant",
            BusinessType::Retail => "retail",
            BusinessType::Pharmacy => "pharmacy",
        }
    }

    /// Name of the pre-aggregated reporting view owned by the data platform.
    pub fn view(self) -> &'static str {
        match self {
            BusinessType::Salon => "SALON_RPT_VW",
            BusinessType::Cafe => "CAFE_RPT_VW",
            BusinessType::Restaurant => "RESTAURANT_RPT_VW",
            BusinessType::Retail => "RETAIL_RPT_VW",
            BusinessType::Pharmacy => "PHARMACY_RPT_VW",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BusinessType::Salon => "Salon",
            BusinessType::Cafe => "Cafe",
            BusinessType::Restaurant => "Restaurant",
            BusinessType::Retail => "Retail",
            BusinessType::Pharmacy => "Pharmacy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_token_regardless_of_case() {
        let expected = [
            ("salon", "SALON_RPT_VW"),
            ("CAFE", "CAFE_RPT_VW"),
            ("Restaurant", "RESTAURANT_RPT_VW"),
            ("rEtAiL", "RETAIL_RPT_VW"),
            ("pharmacy", "PHARMACY_RPT_VW"),
        ];

        for (token, view) in expected {
            let business = BusinessType::resolve(token).expect("known token resolves");
            assert_eq!(business.view(), view);
        }
    }

    #[test]
    fn rejects_unknown_tokens() {
        for token in ["", "bakery", "salons", " salon"] {
            let err = BusinessType::resolve(token).expect_err("token is not a view");
            assert_eq!(err.token, token);
            assert_eq!(err.to_string(), "Invalid business type.");
        }
    }

    #[test]
    fn serializes_as_lowercase_token() {
        let value = serde_json::to_value(BusinessType::Pharmacy).expect("serializes");
        assert_eq!(value, serde_json::json!("pharmacy"));
    }
}
