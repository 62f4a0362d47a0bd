//! Projection of hadith records into display cards.

use crate::models::{FavoriteEntry, Hadith};

const MISSING_TEXT: &str = "نص الحديث غير متوفر";
const UNSPECIFIED: &str = "غير محدد";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeClass {
    Sahih,
    Hasan,
    Daif,
    Mawdoo,
    Other,
}

impl GradeClass {
    pub fn classify(grade: &str) -> Self {
        if grade.contains("صحيح") {
            GradeClass::Sahih
        } else if grade.contains("حسن") {
            GradeClass::Hasan
        } else if grade.contains("ضعيف") {
            GradeClass::Daif
        } else if grade.contains("موضوع") {
            GradeClass::Mawdoo
        } else {
            GradeClass::Other
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            GradeClass::Sahih => "✅",
            GradeClass::Hasan => "👍",
            GradeClass::Daif => "⚠️",
            GradeClass::Mawdoo => "❌",
            GradeClass::Other => "⭐",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            GradeClass::Sahih => "grade-badge grade-sahih",
            GradeClass::Hasan => "grade-badge grade-hasan",
            GradeClass::Daif => "grade-badge grade-daif",
            GradeClass::Mawdoo => "grade-badge grade-mawdoo",
            GradeClass::Other => "grade-badge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeBadge {
    pub label: String,
    pub class: GradeClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HadithCard {
    pub index: usize,
    /// Server id when present, else the position in the result list.
    pub key: String,
    pub text: String,
    pub narrator: Option<String>,
    pub source: Option<String>,
    pub grade: Option<GradeBadge>,
    pub explanation: String,
    /// True when `explanation` was derived locally rather than supplied by the server.
    pub explanation_is_generated: bool,
    pub explanation_link: Option<String>,
    pub is_favorite: bool,
}

pub fn render_card(hadith: &Hadith, index: usize, favorites: &[FavoriteEntry]) -> HadithCard {
    let is_favorite = favorites.iter().any(|f| f.hadith.text == hadith.text);
    let key = hadith
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| index.to_string());

    let text = if hadith.text.is_empty() {
        MISSING_TEXT.to_string()
    } else {
        hadith.text.clone()
    };

    let (explanation, explanation_is_generated) = match hadith.explanation() {
        Some(e) => (e.to_string(), false),
        None => (simple_explanation(hadith).to_string(), true),
    };

    HadithCard {
        index,
        key,
        text,
        narrator: hadith.narrator().map(str::to_string),
        source: hadith.source().map(str::to_string),
        grade: hadith.grade().map(|g| GradeBadge {
            label: g.to_string(),
            class: GradeClass::classify(g),
        }),
        explanation,
        explanation_is_generated,
        explanation_link: hadith.explanation_link().map(str::to_string),
        is_favorite,
    }
}

pub fn render_cards(hadiths: &[Hadith], favorites: &[FavoriteEntry]) -> Vec<HadithCard> {
    hadiths
        .iter()
        .enumerate()
        .map(|(i, h)| render_card(h, i, favorites))
        .collect()
}

const TOPIC_EXPLANATIONS: &[(&[&str], &str)] = &[
    (
        &["الصدق", "صدق"],
        "يحث هذا الحديث على فضيلة الصدق وأهميته في حياة المسلم، وأن الصدق يهدي إلى البر والجنة.",
    ),
    (
        &["الصلاة", "صلاة"],
        "يبين هذا الحديث أهمية الصلاة ومكانتها في الإسلام كركن أساسي من أركان الدين.",
    ),
    (
        &["الزكاة", "زكاة"],
        "يوضح هذا الحديث فضل الزكاة وأثرها في تطهير المال والنفس.",
    ),
    (
        &["الصوم", "صيام"],
        "يبين هذا الحديث فضل الصيام وثوابه العظيم عند الله تعالى.",
    ),
    (
        &["الحج", "حج"],
        "يوضح هذا الحديث فضل الحج وما فيه من مغفرة للذنوب.",
    ),
    (
        &["الكذب", "كذب"],
        "يحذر هذا الحديث من الكذب وخطورته وأنه يهدي إلى الفجور والنار.",
    ),
    (
        &["الجنة", "جنة"],
        "يبين هذا الحديث بعض الأعمال التي توصل إلى الجنة ورضوان الله.",
    ),
    (
        &["النار", "نار"],
        "يحذر هذا الحديث من بعض الأعمال التي تؤدي إلى النار والعياذ بالله.",
    ),
    (
        &["الرحمة", "رحم"],
        "يبين هذا الحديث سعة رحمة الله وأهمية التراحم بين المسلمين.",
    ),
];

/// Short fallback explanation keyed on topic words, then on grade.
pub fn simple_explanation(hadith: &Hadith) -> &'static str {
    for (needles, explanation) in TOPIC_EXPLANATIONS {
        if needles.iter().any(|n| hadith.text.contains(n)) {
            return explanation;
        }
    }

    let grade = hadith.grade.as_deref().unwrap_or("");
    if grade.contains("صحيح") {
        "هذا حديث صحيح ثابت عن النبي ﷺ، يحمل معاني عظيمة وتوجيهات نبوية للمسلمين."
    } else if grade.contains("حسن") {
        "هذا حديث حسن مقبول، يحتوي على إرشادات نبوية مهمة للمسلم في حياته."
    } else {
        "يحتوي هذا الحديث على توجيهات وإرشادات نبوية للمسلمين في أمور دينهم ودنياهم."
    }
}

/// Plain-text form used by the copy action.
pub fn clipboard_text(hadith: &Hadith) -> String {
    format!(
        "{}\n\nالراوي: {}\nالمحدث: {}\nالحكم: {}",
        hadith.text,
        hadith.narrator().unwrap_or(UNSPECIFIED),
        hadith.source().unwrap_or(UNSPECIFIED),
        hadith.grade().unwrap_or(UNSPECIFIED),
    )
}
