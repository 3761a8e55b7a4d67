pub mod azure_agents;
#[cfg(test)]
pub mod scripted;
