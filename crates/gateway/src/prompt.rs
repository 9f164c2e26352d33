//! Prompts sent to the inference backend.

use contact_router_core::types::{DestinationCatalog, DEFAULT_DESTINATION};

/// Prompt asking the model to either name a department or answer directly.
pub fn classification_prompt(catalog: &DestinationCatalog, locale: &str, utterance: &str) -> String {
    format!(
        "You are an intelligent intent classifier for a customer service bot.\n\
         The available departments are: {departments}.\n\
         The user's locale is: {locale}. Please respond appropriately for this locale.\n\
         \n\
         User message: \"{utterance}\"\n\
         \n\
         Instructions:\n\
         1. If the user wants to speak to a specific department, reply with ONLY the department name (e.g., \"Sales\").\n\
         2. If the user is asking a general question, reply with the answer to the question.\n",
        departments = catalog.names().join(", "),
    )
}

/// System instructions for the voice model, which signals a transfer in-band.
pub fn voice_system_prompt(catalog: &DestinationCatalog, locale: &str) -> String {
    format!(
        "You are a helpful voice assistant.\n\
         The caller's locale is: {locale}. Respond in the language of this locale.\n\
         If the user asks to speak to a human agent or a specific department, output the tag [HANDOVER: DepartmentName].\n\
         Available departments: {departments}.\n\
         If the department is not found, output [HANDOVER: {default}].",
        departments = catalog.names().join(", "),
        default = DEFAULT_DESTINATION,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_prompt_lists_catalog_and_locale() {
        let catalog = DestinationCatalog::new([("Sales", "arnA"), ("Support", "arnB")]);
        let prompt = classification_prompt(&catalog, "fr_FR", "I want to buy");

        assert!(prompt.contains("The available departments are: Sales, Support."));
        assert!(prompt.contains("The user's locale is: fr_FR."));
        assert!(prompt.contains("User message: \"I want to buy\""));
    }

    #[test]
    fn test_voice_prompt_names_marker_format() {
        let catalog = DestinationCatalog::new([("Sales", "arnA")]);
        let prompt = voice_system_prompt(&catalog, "en_US");

        assert!(prompt.contains("[HANDOVER: DepartmentName]"));
        assert!(prompt.contains("[HANDOVER: Default]"));
        assert!(prompt.contains("Available departments: Sales."));
    }
}
