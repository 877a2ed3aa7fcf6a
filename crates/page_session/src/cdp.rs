//! Devtools commands used beyond what headless_chrome wraps: listing the frame
//! tree and evaluating inside one frame's document, whatever origin it was
//! loaded from.

use headless_chrome::protocol::cdp::types::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FrameHandle;

/// Name of the isolated world created in each child frame.
pub const WORLD_NAME: &str = "oddsboard";

#[derive(Debug, Serialize)]
pub struct GetFrameTree {}

impl Method for GetFrameTree {
    const NAME: &'static str = "Page.getFrameTree";
    type ReturnObject = FrameTreeReturn;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTreeReturn {
    pub frame_tree: FrameTreeNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTreeNode {
    pub frame: FrameInfo,
    #[serde(default)]
    pub child_frames: Vec<FrameTreeNode>,
}

#[derive(Debug, Deserialize)]
pub struct FrameInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIsolatedWorld {
    pub frame_id: String,
    pub world_name: String,
    // Protocol spelling.
    #[serde(rename = "grantUniveralAccess")]
    pub grant_universal_access: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolatedWorldReturn {
    pub execution_context_id: i64,
}

impl Method for CreateIsolatedWorld {
    const NAME: &'static str = "Page.createIsolatedWorld";
    type ReturnObject = IsolatedWorldReturn;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateInContext {
    pub expression: String,
    pub context_id: i64,
    pub return_by_value: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateReturn {
    pub result: RemoteValue,
    #[serde(default)]
    pub exception_details: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteValue {
    #[serde(default)]
    pub value: Option<Value>,
}

impl Method for EvaluateInContext {
    const NAME: &'static str = "Runtime.evaluate";
    type ReturnObject = EvaluateReturn;
}

/// Frame tree in page order (pre-order, children in document order). Paths
/// are child indices, matching the `window.frames` walk for same-origin frames.
pub fn flatten(tree: &FrameTreeNode) -> Vec<FrameHandle> {
    let mut out = Vec::new();
    walk(tree, Vec::new(), &mut out);
    out
}

fn walk(node: &FrameTreeNode, path: Vec<usize>, out: &mut Vec<FrameHandle>) {
    out.push(FrameHandle {
        path: path.clone(),
        name: node.frame.name.clone().unwrap_or_default(),
        id: Some(node.frame.id.clone()),
    });
    for (i, child) in node.child_frames.iter().enumerate() {
        let mut child_path = path.clone();
        child_path.push(i);
        walk(child, child_path, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cross_origin_children_keep_their_frame_ids() {
        let reply: FrameTreeReturn = serde_json::from_value(json!({
            "frameTree": {
                "frame": { "id": "MAIN", "url": "https://www.sport368.com/", "loaderId": "L0" },
                "childFrames": [
                    { "frame": { "id": "ADS", "parentId": "MAIN", "url": "https://ads.example/" } },
                    {
                        "frame": { "id": "DASH", "parentId": "MAIN", "name": "mainIframe", "url": "https://odds.sport368.net/" },
                        "childFrames": [
                            { "frame": { "id": "ODDS", "parentId": "DASH", "name": "oddsFrame", "url": "https://data.sport368.net/" } }
                        ]
                    }
                ]
            }
        }))
        .unwrap();

        let frames = flatten(&reply.frame_tree);

        let summary: Vec<(Vec<usize>, &str, Option<&str>)> = frames
            .iter()
            .map(|f| (f.path.clone(), f.name.as_str(), f.id.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (vec![], "", Some("MAIN")),
                (vec![0], "", Some("ADS")),
                (vec![1], "mainIframe", Some("DASH")),
                (vec![1, 0], "oddsFrame", Some("ODDS")),
            ]
        );
        assert!(frames[0].is_main());
    }

    #[test]
    fn commands_serialize_with_protocol_names() {
        let world = CreateIsolatedWorld {
            frame_id: "DASH".into(),
            world_name: WORLD_NAME.into(),
            grant_universal_access: true,
        };
        assert_eq!(
            serde_json::to_value(&world).unwrap(),
            json!({ "frameId": "DASH", "worldName": "oddsboard", "grantUniveralAccess": true })
        );

        let eval = EvaluateInContext { expression: "1".into(), context_id: 12, return_by_value: true };
        assert_eq!(
            serde_json::to_value(&eval).unwrap(),
            json!({ "expression": "1", "contextId": 12, "returnByValue": true })
        );
        assert_eq!(serde_json::to_value(GetFrameTree {}).unwrap(), json!({}));
    }
}
