use crate::model::player::FacialFeatures;
use serde::{Deserialize, Serialize};
use url::Url;

/// Identity and cosmetics sent once as query parameters when the
/// signaling socket is opened. `activity` is what the server uses to pick
/// a themed room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub name: String,
    pub color: String,
    pub activity: String,
    pub facial_features: FacialFeatures,
}

impl JoinRequest {
    pub fn new(name: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: "#f4a261".to_owned(),
            activity: activity.into(),
            facial_features: FacialFeatures::default(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_facial_features(mut self, features: FacialFeatures) -> Self {
        self.facial_features = features;
        self
    }

    /// Appends the join parameters to the signaling endpoint.
    pub fn to_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut()
            .append_pair("name", &self.name)
            .append_pair("color", &self.color)
            .append_pair("activity", &self.activity)
            .append_pair("eyeStyle", &self.facial_features.eye_style)
            .append_pair("noseStyle", &self.facial_features.nose_style)
            .append_pair("mouthStyle", &self.facial_features.mouth_style)
            .append_pair("characterType", &self.facial_features.character_type);
        Ok(url)
    }
}
