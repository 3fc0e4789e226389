//! System prompt assembly.

/// Build the top-level agent system prompt.
pub fn build_system_prompt(
    name: &str,
    description: &str,
    workspace: &str,
    skills_descriptions: &str,
) -> String {
    let mut parts = vec![
        format!("You are {name}, {description}"),
        format!("Working directory: {workspace}"),
    ];

    if !skills_descriptions.is_empty() {
        parts.push(format!("\n**Skills:**\n{skills_descriptions}"));
    }

    parts.push(
        "\n**Core Capabilities:**\n\
         - **Search & Research**: Use search tools (grep, list_dir) to find information before answering\n\
         - **Summarize & Synthesize**: Combine multiple search results into a comprehensive answer\n\
         - **File Operations**: Read, write, and edit files as needed to complete tasks\n\
         - **Shell Commands**: Execute bash commands for system operations when required"
            .to_string(),
    );

    parts.push(
        "\n**Referencing Earlier Results:**\n\
         - **Direct Reference**: Use `${tool_result.N}` (0-indexed)\n\
         - **Last Result**: Use `${tool_result.last}`\n\
         - **Memory Storage**: Use the `memory` tool and `${memory.KEY}`"
            .to_string(),
    );

    parts.push(
        "\n**Response Guidelines:**\n\
         - Always search for relevant information first before providing answers\n\
         - When multiple sources are available, synthesize them into a coherent response\n\
         - If search yields no results, clearly state what was searched and what couldn't be found\n\
         - Use tools immediately when a task matches - don't just describe what you would do\n\
         - Prefer concrete actions and results over lengthy explanations"
            .to_string(),
    );

    parts.join("\n")
}

/// Build a sub-agent system prompt from its config and tool descriptions.
///
/// `tool_lines` is the already-rendered "- name: description" block for
/// the sub-agent's allowed tools; empty means no tool section.
pub fn build_subagent_prompt(
    name: &str,
    system_prompt: &str,
    workspace: &str,
    tool_lines: &str,
) -> String {
    let identity = if system_prompt.is_empty() {
        format!("You are {name} agent.")
    } else {
        system_prompt.to_string()
    };

    let mut parts = vec![identity, format!("Working directory: {workspace}")];
    if !tool_lines.is_empty() {
        parts.push(format!("\nAvailable tools:\n{tool_lines}"));
    }
    parts.join("\n")
}
