use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{BlueprintEffectType, ParsedBlueprintAttributes, ProcessedBlueprint};

/// An owned asset as returned by the NFT indexer, before any game-level
/// interpretation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAsset {
    pub mint_address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Option<Vec<RawAssetAttribute>>,
}

/// One Metaplex-style `{trait_type, value}` metadata attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAssetAttribute {
    pub trait_type: String,
    pub value: Value,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRejection {
    #[error("asset has no metadata attributes")]
    NoAttributes,
    #[error("missing required attribute `{0}`")]
    MissingAttribute(&'static str),
    #[error("attribute `{name}` has invalid value `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

const TRAIT_BLUEPRINT_ID: &str = "Blueprint ID";
const TRAIT_EFFECT_TYPE: &str = "Effect Type";
const TRAIT_EFFECT_VALUE: &str = "Effect Value";
const TRAIT_TIER: &str = "Tier";
const TRAIT_DESCRIPTION: &str = "Description";

/// Strict decode of an owned asset into a blueprint. Every required
/// attribute must be present and well-typed; anything else is a tagged
/// rejection, never a partial result.
pub fn parse_blueprint(asset: &RawAsset) -> Result<ProcessedBlueprint, ParseRejection> {
    let attributes = asset
        .attributes
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or(ParseRejection::NoAttributes)?;

    let blueprint_id = required_string(attributes, TRAIT_BLUEPRINT_ID)?;
    let effect_type = required_effect_type(attributes)?;
    let effect_value = required_u32(attributes, TRAIT_EFFECT_VALUE)?;
    let tier = required_u32(attributes, TRAIT_TIER)?;
    let description = required_string(attributes, TRAIT_DESCRIPTION)?;

    Ok(ProcessedBlueprint {
        mint_address: asset.mint_address.clone(),
        name: asset
            .name
            .clone()
            .unwrap_or_else(|| "Unknown Blueprint".to_string()),
        image_url: asset.image.clone(),
        nft_description: asset
            .description
            .clone()
            .unwrap_or_else(|| "No description.".to_string()),
        parsed_attributes: ParsedBlueprintAttributes {
            blueprint_id,
            effect_type,
            effect_value,
            tier,
            description,
        },
    })
}

fn find<'a>(attributes: &'a [RawAssetAttribute], name: &str) -> Option<&'a Value> {
    attributes
        .iter()
        .find(|a| a.trait_type == name)
        .map(|a| &a.value)
}

fn required_string(
    attributes: &[RawAssetAttribute],
    name: &'static str,
) -> Result<String, ParseRejection> {
    let value = find(attributes, name).ok_or(ParseRejection::MissingAttribute(name))?;
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ParseRejection::InvalidValue { name, value: value.to_string() }),
    }
}

/// Numeric attributes arrive as JSON numbers or as numeric strings,
/// depending on the minting tool.
fn required_u32(
    attributes: &[RawAssetAttribute],
    name: &'static str,
) -> Result<u32, ParseRejection> {
    let value = find(attributes, name).ok_or(ParseRejection::MissingAttribute(name))?;
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ParseRejection::InvalidValue { name, value: value.to_string() })
}

fn required_effect_type(
    attributes: &[RawAssetAttribute],
) -> Result<BlueprintEffectType, ParseRejection> {
    let value = find(attributes, TRAIT_EFFECT_TYPE)
        .ok_or(ParseRejection::MissingAttribute(TRAIT_EFFECT_TYPE))?;
    serde_json::from_value(value.clone()).map_err(|_| ParseRejection::InvalidValue {
        name: TRAIT_EFFECT_TYPE,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_asset() -> RawAsset {
        RawAsset {
            mint_address: "Mint1111".into(),
            name: Some("Expanded Cargo Bay".into()),
            description: Some("Guild-certified hull extension.".into()),
            image: Some("https://example.com/cargo.png".into()),
            attributes: Some(vec![
                attr("Blueprint ID", json!("bp-cargo-1")),
                attr("Effect Type", json!("INCREASE_CARGO_CAPACITY")),
                attr("Effect Value", json!(30)),
                attr("Tier", json!(1)),
                attr("Description", json!("Adds 30 cargo units")),
            ]),
        }
    }

    fn attr(trait_type: &str, value: serde_json::Value) -> RawAssetAttribute {
        RawAssetAttribute { trait_type: trait_type.into(), value }
    }

    #[test]
    fn test_parses_valid_asset() {
        let blueprint = parse_blueprint(&valid_asset()).unwrap();
        assert_eq!(blueprint.mint_address, "Mint1111");
        assert_eq!(blueprint.parsed_attributes.blueprint_id, "bp-cargo-1");
        assert_eq!(
            blueprint.parsed_attributes.effect_type,
            BlueprintEffectType::IncreaseCargoCapacity
        );
        assert_eq!(blueprint.parsed_attributes.effect_value, 30);
        assert_eq!(blueprint.parsed_attributes.tier, 1);
    }

    #[test]
    fn test_accepts_numeric_strings() {
        let mut asset = valid_asset();
        asset.attributes.as_mut().unwrap()[2] = attr("Effect Value", json!("30"));
        let blueprint = parse_blueprint(&asset).unwrap();
        assert_eq!(blueprint.parsed_attributes.effect_value, 30);
    }

    #[test]
    fn test_rejects_missing_attribute() {
        let mut asset = valid_asset();
        asset.attributes.as_mut().unwrap().retain(|a| a.trait_type != "Tier");
        assert_eq!(
            parse_blueprint(&asset).unwrap_err(),
            ParseRejection::MissingAttribute("Tier")
        );
    }

    #[test]
    fn test_rejects_unknown_effect_type() {
        let mut asset = valid_asset();
        asset.attributes.as_mut().unwrap()[1] = attr("Effect Type", json!("INCREASE_WARP_SPEED"));
        assert!(matches!(
            parse_blueprint(&asset).unwrap_err(),
            ParseRejection::InvalidValue { name: "Effect Type", .. }
        ));
    }

    #[test]
    fn test_rejects_asset_without_attributes() {
        let mut asset = valid_asset();
        asset.attributes = None;
        assert_eq!(parse_blueprint(&asset).unwrap_err(), ParseRejection::NoAttributes);
    }
}
