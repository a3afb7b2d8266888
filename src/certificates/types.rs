//! Certificate template and bundle types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A certificate layout managed by admins.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateTemplate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub background_image: Option<String>,
    pub template_data: TemplateData,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canvas and positioned elements, as stored by the template editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    #[serde(default)]
    pub background_url: Option<String>,
    #[serde(default)]
    pub elements: Vec<TemplateElement>,
    #[serde(default)]
    pub canvas_width: f64,
    #[serde(default)]
    pub canvas_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Participant field substituted at render time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    StaticText,
    VariableText,
    Image,
    QrCode,
    Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Render-ready certificate data. Nothing is rendered server-side.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateBundle {
    pub activity: ActivitySummary,
    pub template: TemplateSummary,
    pub participant: Participant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    pub id: i64,
    pub name: String,
    pub activity_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub id: i64,
    pub name: String,
    pub background_image: Option<String>,
    pub template_data: TemplateData,
}

#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub registration_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub university: String,
    pub activity_name: String,
    /// e.g. "17 August 2024", empty when the activity has no start date
    pub activity_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_data_from_editor_json() {
        let data: TemplateData = serde_json::from_str(
            r#"{
                "backgroundUrl": null,
                "canvasWidth": 1123,
                "canvasHeight": 794,
                "elements": [
                    {"id": "n", "type": "variable-text", "x": 10, "y": 20, "width": 300,
                     "height": 40, "variable": "name", "fontSize": 32, "textAlign": "center"},
                    {"id": "q", "type": "qr-code", "x": 0, "y": 0, "width": 80, "height": 80}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(data.elements.len(), 2);
        assert_eq!(data.elements[0].kind, ElementKind::VariableText);
        assert_eq!(data.elements[0].text_align, Some(TextAlign::Center));
        assert_eq!(data.elements[1].kind, ElementKind::QrCode);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["elements"][0]["fontSize"], 32.0);
        assert!(json["elements"][1].get("variable").is_none());
    }
}
