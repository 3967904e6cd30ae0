// Chat endpoint: request validation and the classify-then-generate flow.
// All model calls go through `gateway::ModelGateway`.

pub mod handlers;
pub mod models;
