use tracing::info;

use crate::{
    error::Result,
    remote::ReasoningAgent,
    types::{AgentReply, AnalysisRequest},
};

/// Starting points offered to users who don't know what to ask.
pub const QUERY_SUGGESTIONS: [&str; 5] = [
    "What is the summary of this video?",
    "Identify the key people and places mentioned.",
    "What are the main themes or subjects?",
    "Extract important quotes or dialogues.",
    "What happens at the end of the video?",
];

/// Wrap the user's question in the analysis instruction sent to the agent.
pub fn build_instruction(query: &str) -> String {
    format!(
        "Analyze the uploaded video for content and context.\n\
         Respond to the following query using video insights and supplementary web research:\n\
         {query}\n\
         Provide a clear, detailed and actionable response."
    )
}

pub async fn dispatch<A>(agent: &A, request: &AnalysisRequest) -> Result<AgentReply>
where
    A: ReasoningAgent + ?Sized,
{
    let instruction = build_instruction(&request.query);
    info!(video = %request.video.name, "dispatching analysis");
    agent.run(&instruction, &request.video).await
}
