pub mod intercept;
pub mod runner;

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            options,
            correct_answer,
            explanation: explanation.into(),
        }
    }

    /// Checks the shape every question must have before it can be played:
    /// at least two options and a correct answer pointing into them.
    pub fn validate(&self) -> Result<(), InvalidQuestion> {
        if self.options.len() < 2 {
            return Err(InvalidQuestion::TooFewOptions {
                question_id: self.id.clone(),
                options: self.options.len(),
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(InvalidQuestion::AnswerOutOfRange {
                question_id: self.id.clone(),
                correct_answer: self.correct_answer,
                options: self.options.len(),
            });
        }
        Ok(())
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidQuestion {
    #[error("question {question_id} has {options} option(s), at least 2 are required")]
    TooFewOptions { question_id: String, options: usize },

    #[error("question {question_id} marks option {correct_answer} as correct but has only {options}")]
    AnswerOutOfRange {
        question_id: String,
        correct_answer: usize,
        options: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct_answer: usize) -> QuizQuestion {
        QuizQuestion::new(
            "q1",
            "Which one?",
            options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
            "Because.",
        )
    }

    #[test]
    fn accepts_well_formed_question() {
        let q = question(&["a", "b", "c"], 2);
        assert_eq!(q.validate(), Ok(()));
        assert_eq!(q.correct_option(), Some("c"));
    }

    #[test]
    fn rejects_single_option() {
        let q = question(&["only"], 0);
        assert!(matches!(
            q.validate(),
            Err(InvalidQuestion::TooFewOptions { options: 1, .. })
        ));
    }

    #[test]
    fn rejects_answer_past_the_end() {
        let q = question(&["a", "b"], 2);
        assert!(matches!(
            q.validate(),
            Err(InvalidQuestion::AnswerOutOfRange { correct_answer: 2, .. })
        ));
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "id": "q_fs_2",
            "question": "In Kafka, what do we call the 'apps that talk'?",
            "options": ["Listeners", "Consumers", "Producers", "Brokers"],
            "correctAnswer": 2,
            "explanation": "Producers write events."
        }"#;
        let q: QuizQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_answer, 2);
        assert_eq!(q.correct_option(), Some("Producers"));
    }
}
