use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ModulePointRequest {
    pub rank: i32,
    pub points: i32,
}
