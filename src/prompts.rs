// Output-format instructions appended to the user's query, keyed by the
// prompt name picked in the UI.

pub const USER_STORY_PROMPT_NAME: &str = "User Story";
pub const EPIC_PROMPT_NAME: &str = "Epic";

pub const USER_STORY_TEMPLATE: &str = "\nAnd follow this below format while generating user story\n**Title**: [Insert User Story Title Here]\n**Acceptance criteria** :\n[Insert Acceptance criteria Here]\n**Functional Test Cases**: \n[Insert Functional Test Cases Here]";

pub const EPIC_TEMPLATE: &str = "\nAnd follow this below format while generating the Epic\nEpic Name: [Clear and descriptive name for the Epic]\nEpic Summary: [A brief summary of what this epic is about, covering the main objective and expected outcome.]\nEpic Description:\n1. Objective: [Describe the primary objective of this epic. What are you trying to achieve? Why is this epic important?]\n2. Problem Statement: [Clearly state the problem or challenge this epic is addressing. Why is this problem worth solving?]\n3. Scope: [Define the boundaries of the epic. What will be included and what will not be included? Mention any key features, components, or tasks that will fall under this epic.]\n4. Success Criteria/Definition of Done: [What are the measurable outcomes or criteria that will indicate this epic is complete and successful?]\n5. Dependencies: [Identify any dependencies on other epics, tasks, teams, or external factors that could affect the completion of this epic.]\n6. Risks & Mitigations: [Describe any potential risks associated with this epic and how you plan to mitigate them.]\n7. Timeline & Milestones:[Provide an estimated timeline for the epic, including key milestones and deadlines.]\n8. Stakeholders: [Identify the key stakeholders involved in this epic, such as team members, product owners, or external parties.]";

pub const DEFAULT_TEMPLATE: &str = "\nGenerate comprehensive answer for the user query.";

/// Template for `active_prompt`. Matching is exact; anything else, including
/// the empty string, gets the default.
pub fn prompt_template(active_prompt: &str) -> &'static str {
    match active_prompt {
        USER_STORY_PROMPT_NAME => USER_STORY_TEMPLATE,
        EPIC_PROMPT_NAME => EPIC_TEMPLATE,
        _ => DEFAULT_TEMPLATE,
    }
}
