use serde_json::{json, Value};

use crate::i18n::Language;

const PROMPT_EN: &str = "You are a power scouter from the Dragon Ball Z universe. Analyze the subject in this image and determine their power level. Provide a numerical power level and a brief, dramatic, in-character reason for your assessment, written in English. Be creative. Your response must be a JSON object.";

const PROMPT_ZH: &str = "你是一个来自《龙珠Z》宇宙的战斗力侦测器。分析这张图片中的对象并确定他们的战斗力。提供一个数值形式的战斗力，并以侦测器的口吻给出一个简短、戏剧性的评估理由，必须用中文书写。请发挥创造力。你的回应必须是一个JSON对象。";

const REASONING_EN: &str =
    "A short, in-character analysis from the scouter's perspective, written in English.";
const REASONING_ZH: &str = "一个简短的、符合侦测器口吻的分析，必须用中文书写。";

const POWER_LEVEL_DESCRIPTION: &str = "The calculated power level value.";

pub const POWER_LEVEL_FIELD: &str = "powerLevel";
pub const REASONING_FIELD: &str = "reasoning";

/// Scanner instruction for `language`.
pub fn instruction(language: Language) -> &'static str {
    match language {
        Language::Chinese => PROMPT_ZH,
        Language::English => PROMPT_EN,
    }
}

/// Same as [`instruction`] but keyed by a raw code; unknown codes use English.
pub fn instruction_for_code(code: &str) -> &'static str {
    instruction(Language::from_code(code).unwrap_or_default())
}

fn reasoning_description(language: Language) -> &'static str {
    match language {
        Language::Chinese => REASONING_ZH,
        Language::English => REASONING_EN,
    }
}

/// Response-shape hint: an object with an integer score and a narrative, both required.
pub fn response_schema(language: Language) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            POWER_LEVEL_FIELD: {
                "type": "INTEGER",
                "description": POWER_LEVEL_DESCRIPTION,
            },
            REASONING_FIELD: {
                "type": "STRING",
                "description": reasoning_description(language),
            },
        },
        "required": [POWER_LEVEL_FIELD, REASONING_FIELD],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_code_uses_english_prompt() {
        assert_eq!(instruction_for_code("fr"), PROMPT_EN);
        assert_eq!(instruction_for_code("zh"), PROMPT_ZH);
    }

    #[test]
    fn schema_requires_both_fields() {
        let schema = response_schema(Language::Chinese);
        assert_eq!(schema["required"], json!(["powerLevel", "reasoning"]));
        assert_eq!(schema["properties"]["powerLevel"]["type"], "INTEGER");
        assert_eq!(
            schema["properties"]["reasoning"]["description"],
            REASONING_ZH
        );
    }
}
