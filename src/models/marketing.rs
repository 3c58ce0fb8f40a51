// SPDX-License-Identifier: MIT

//! Marketing banner models. Banners travel in backend shape; the scheduling
//! window (`starts_at`/`ends_at`) is evaluated by the backend filter, not
//! client-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub enum BannerKind {
    Image,
    Video,
}

/// A `marketing_banners` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/types/generated/")
)]
pub struct MarketingBanner {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: BannerKind,
    pub asset_url: String,
    pub link_url: Option<String>,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub impressions: Option<i64>,
    pub clicks: Option<i64>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a banner.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBanner {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: BannerKind,
    #[validate(url)]
    pub asset_url: String,
    #[validate(url)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
}

/// Partial banner edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BannerUpdate {
    #[validate(length(min = 1, max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<BannerKind>,
    #[validate(url)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    #[validate(url)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

/// Engagement event recorded against a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerEvent {
    Impression,
    Click,
}

impl BannerEvent {
    /// Wire label used by the `record_marketing_event` procedure.
    pub fn as_str(self) -> &'static str {
        match self {
            BannerEvent::Impression => "impression",
            BannerEvent::Click => "click",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_kind_maps_the_type_column() {
        let raw = serde_json::json!({
            "id": "0a9f4f3a-5b7e-4c1d-8e2f-6d5c4b3a2918",
            "title": "Black Friday",
            "type": "video",
            "asset_url": "https://cdn.example.com/bf.mp4",
            "link_url": null,
            "active": true,
            "starts_at": null,
            "ends_at": "2026-11-30T23:59:59+00:00",
            "impressions": 10,
            "clicks": 2,
            "created_by": null,
            "created_at": "2026-11-01T00:00:00+00:00"
        });

        let banner: MarketingBanner = serde_json::from_value(raw).unwrap();
        assert_eq!(banner.kind, BannerKind::Video);
        assert!(banner.active);
    }

    #[test]
    fn new_banner_rejects_invalid_asset_url() {
        use validator::Validate;

        let banner = NewBanner {
            title: "Promo".to_string(),
            kind: BannerKind::Image,
            asset_url: "not a url".to_string(),
            link_url: None,
            active: true,
            starts_at: None,
            ends_at: None,
            created_by: None,
        };
        assert!(banner.validate().is_err());
    }

    #[test]
    fn event_labels_match_the_procedure_contract() {
        assert_eq!(BannerEvent::Impression.as_str(), "impression");
        assert_eq!(BannerEvent::Click.as_str(), "click");
    }
}
