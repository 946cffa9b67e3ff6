use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SEED_CLASS_ID: &str = "3eme-ens";
pub const SEED_CLASS_NAME: &str = "3ème ENS - Ivoire";
pub const SEED_STUDENT_COUNT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "M" | "m" => Some(Self::M),
            "F" | "f" => Some(Self::F),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::F => "F",
        }
    }
}

/// One mark for one assessment. `coefficient` is copied from the assessment
/// when the grade is written and is not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub assessment_id: String,
    pub value: f64,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    #[serde(default)]
    pub grades: Vec<Grade>,
}

impl Student {
    pub fn new(id: impl Into<String>, first_name: &str, last_name: &str, gender: Gender) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gender,
            grades: Vec::new(),
        }
    }

    pub fn grade_for(&self, assessment_id: &str) -> Option<&Grade> {
        self.grades.iter().find(|g| g.assessment_id == assessment_id)
    }

    /// "First Last", as used in generated narratives.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "Last First", as shown in the grade sheet.
    pub fn sheet_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub date: String,
    pub coefficient: f64,
    pub max_score: f64,
}

/// The unit of persistence. Students and the catalog sit behind `Arc` so a
/// new snapshot can share every entry it did not touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassData {
    pub id: String,
    pub name: String,
    pub students: Vec<Arc<Student>>,
    pub assessments: Arc<Vec<Assessment>>,
}

impl ClassData {
    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.id == student_id)
            .map(|s| s.as_ref())
    }

    pub fn assessment(&self, assessment_id: &str) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.id == assessment_id)
    }
}

const FIRST_NAMES: [&str; SEED_STUDENT_COUNT] = [
    "Ahmed", "Koffi", "Kouassi", "Amadou", "Fatoumata", "Aminata", "Jean", "Marie", "Kouakou",
    "Mariam", "Moussa", "Sékou", "Sidiki", "Tidiane", "Yasmine", "Awa", "Bakary", "Djénéba",
    "Issa", "Lamine", "Oumar", "Salif", "Zoumana", "Affou", "Bintou", "Fanta", "Hassan",
    "Ibrahim", "Kadidia", "Maimouna", "N'Goran", "Ousmane", "Rokiatou", "Souleymane", "Tenin",
    "Yacouba", "Adama", "Balla", "Cheick", "Drissa", "Ehouman", "Fodé", "Gnima", "Habibou",
    "Inza", "Jérôme", "Konan", "Lassina", "Modibo", "Nanourou",
];

const LAST_NAMES: [&str; SEED_STUDENT_COUNT] = [
    "Kouassi", "Koné", "Traoré", "Bakayoko", "Bamba", "Coulibaly", "Diallo", "Diomandé", "Gbon",
    "Ouattara", "Sylla", "Touré", "Yao", "Yapi", "Achi", "Bedié", "Cissé", "Dibi", "Essis",
    "Fofana", "Gnahoré", "Hien", "Iriri", "Kaboré", "Lath", "Meité", "N'Guessan", "Oulaï",
    "Poyé", "Savané", "Tanoh", "Uka", "Vangah", "Wognin", "Xery", "Yoboué", "Zadi", "Ahoussi",
    "Brou", "Doffou", "Esmel", "Gnaba", "Houphouët", "Ismaël", "Kassi", "Loho", "M'Bahia",
    "N'Dri", "Obrou", "Sery",
];

fn seed_assessments() -> Vec<Assessment> {
    vec![
        Assessment {
            id: "a1".to_string(),
            title: "Interrogation Math".to_string(),
            date: "2024-03-01".to_string(),
            coefficient: 1.0,
            max_score: 20.0,
        },
        Assessment {
            id: "a2".to_string(),
            title: "Composition Français".to_string(),
            date: "2024-03-15".to_string(),
            coefficient: 2.0,
            max_score: 20.0,
        },
    ]
}

/// Demo class loaded into a fresh workspace.
pub fn seed_class_data() -> ClassData {
    let mut rng = rand::rng();
    let students = (0..SEED_STUDENT_COUNT)
        .map(|i| {
            let gender = if i % 2 == 0 { Gender::M } else { Gender::F };
            let mut student = Student::new(
                (i + 1).to_string(),
                FIRST_NAMES[i % FIRST_NAMES.len()],
                LAST_NAMES[(i * 7) % LAST_NAMES.len()],
                gender,
            );
            student.grades = vec![
                Grade {
                    assessment_id: "a1".to_string(),
                    value: rng.random_range(8..20) as f64,
                    coefficient: 1.0,
                },
                Grade {
                    assessment_id: "a2".to_string(),
                    value: rng.random_range(10..20) as f64,
                    coefficient: 2.0,
                },
            ];
            Arc::new(student)
        })
        .collect();

    ClassData {
        id: SEED_CLASS_ID.to_string(),
        name: SEED_CLASS_NAME.to_string(),
        students,
        assessments: Arc::new(seed_assessments()),
    }
}
