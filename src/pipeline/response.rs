//! Canned replies for the rule-based strategy.

use crate::pipeline::types::Category;

/// Reply for emails that need action.
pub const REQUEST_RECEIVED_REPLY: &str = "Recebemos sua solicitação. Nosso time técnico já está analisando o seu caso e retornaremos com uma atualização de status em breve.";

/// Reply for thanks, greetings and other social emails.
pub const THANKS_REPLY: &str =
    "Agradecemos muito pela sua mensagem e pelo contato. Desejamos um excelente dia e sucesso!";

/// Used when no canned reply exists for a category.
pub const FALLBACK_REPLY: &str = "Não foi possível gerar uma resposta automática.";

/// Suggested reply for a category. Pure and total.
///
/// LLM categories have no canned text (the model writes those replies) and
/// get the fallback.
pub fn suggest(category: Category) -> &'static str {
    match category {
        Category::Productive => REQUEST_RECEIVED_REPLY,
        Category::Unproductive => THANKS_REPLY,
        Category::Priority | Category::CanWait => FALLBACK_REPLY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_reply_per_rule_category() {
        assert_eq!(suggest(Category::Productive), REQUEST_RECEIVED_REPLY);
        assert_eq!(suggest(Category::Unproductive), THANKS_REPLY);
        assert_ne!(REQUEST_RECEIVED_REPLY, THANKS_REPLY);
    }

    #[test]
    fn other_categories_fall_back() {
        assert_eq!(suggest(Category::Priority), FALLBACK_REPLY);
        assert_eq!(suggest(Category::CanWait), FALLBACK_REPLY);
    }

    #[test]
    fn deterministic() {
        for category in [
            Category::Productive,
            Category::Unproductive,
            Category::Priority,
            Category::CanWait,
        ] {
            assert_eq!(suggest(category), suggest(category));
            assert!(!suggest(category).is_empty());
        }
    }
}
