//! Prompt text for the LLM-backed oracles.

/// System prompt for candidate generation: one refinement step per call.
pub const GENERATOR_SYSTEM: &str = "\
You lead a team of Cypher experts answering questions over a Neo4j knowledge graph.
- Read the user question and the reasoning history, then take exactly ONE step forward:
    - hand a sub-task to a team member
    - generate or refine a Cypher query
    - choose a single tool call
- Reply with the intermediate state your step produced:
    - the member's answer to the sub-task
    - the generated or refined Cypher query
    - the result of the tool call
Hints:
- Before solving, mapping entities to graph labels and inspecting schema metadata are good first steps.
- When you produce a final query, reply with the query only.";

/// System prompt for the reflection oracle.
pub const REFLECTOR_SYSTEM: &str =
    "You reflect on and score intermediate reasoning states of a Cypher query assistant.";

/// User message for candidate generation.
///
/// The initial response is generated from the bare question; later rounds
/// carry the trajectory of the selected frontier node.
pub fn candidate_prompt(question: &str, trajectory: &[String]) -> String {
    if trajectory.is_empty() {
        return question.to_string();
    }
    format!(
        "User question: {}\n\nReasoning history:\n{}",
        question,
        trajectory.join("\n")
    )
}

/// User message asking the reflector to judge `candidate`.
pub fn reflection_prompt(question: &str, candidate: &str) -> String {
    format!(
        "Reflect on and score the following user question and current intermediate reasoning state.\n\
         User question: {question}\n\
         Intermediate reasoning state: {candidate}\n\n\
         Reply with a single JSON object and nothing else:\n\
         {{\"plan\": \"<your detailed analysis and the next step>\", \
         \"score\": <integer 0-10>, \
         \"terminal\": <true if the state fully answers the question, otherwise false>}}"
    )
}
