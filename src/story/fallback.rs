use super::character::child_word;
use crate::models::{Story, StoryChapter};

fn chapter(title: &str, paragraph: String, illustration: String) -> StoryChapter {
    StoryChapter {
        title: title.to_string(),
        paragraph,
        illustration,
    }
}

/// Reviewed five-chapter story served when every generation attempt fails.
/// Depends only on the child's name, age and gender.
pub fn fallback_story(name: &str, age: &str, gender: &str) -> Story {
    let child = child_word(gender);

    Story {
        title: format!("{}의 작은 용기", name),
        character: format!("호기심 많고 마음이 따뜻한 {}살 {} {}", age, child, name),
        chapters: vec![
            chapter(
                "반짝이는 아침",
                format!(
                    "햇살이 창문을 톡톡 두드리는 아침이었어요. {}는 이불 속에서 기지개를 쭉 켰어요. \
                     식탁 위에는 알록달록한 반찬이 가득했어요.",
                    name
                ),
                format!("아침 햇살이 드는 부엌 식탁 앞에 앉은 {}", name),
            ),
            chapter(
                "작은 친구의 등장",
                format!(
                    "그때 접시 옆에서 콩알만 한 요정 '용기콩'이 폴짝 뛰어올랐어요. \
                     \"안녕, {}! 오늘은 나랑 특별한 모험을 해 볼래?\" {}는 눈을 동그랗게 떴어요.",
                    name, name
                ),
                format!("접시 옆에서 뛰어오르는 작은 초록 요정과 놀란 표정의 {}", name),
            ),
            chapter(
                "망설이는 마음",
                format!(
                    "{}는 처음 보는 초록 채소를 보고 고개를 저었어요. 입술이 꼭 다물어졌어요. \
                     창밖에서 강아지 바둑이가 꼬리를 살랑살랑 흔들며 지켜보았어요.",
                    name
                ),
                format!("초록 채소를 바라보며 망설이는 {}와 창밖의 강아지", name),
            ),
            chapter(
                "스스로 내딛은 한 걸음",
                format!(
                    "{}는 숨을 크게 들이쉬고 스스로 숟가락을 들었어요. 조심조심 한 입 먹어 보니 \
                     아삭아삭 소리가 났어요. \"어? 생각보다 달콤해!\" {}는 한 입 더 먹어 봤어요.",
                    name, name
                ),
                format!("숟가락을 들고 채소를 맛보며 눈이 커진 {}", name),
            ),
            chapter(
                "환하게 웃는 저녁",
                format!(
                    "용기콩이 반짝반짝 빛나며 빙글빙글 춤을 추었어요. 바둑이도 멍멍 짖으며 \
                     박수를 치듯 뛰었어요. {}의 마음속에도 작은 별 하나가 환하게 켜졌어요.",
                    name
                ),
                format!("빛나는 요정과 신난 강아지 사이에서 활짝 웃는 {}", name),
            ),
        ],
        ending: format!(
            "그날 밤, {}는 내일도 새로운 것을 스스로 해 보겠다고 마음먹으며 꿈나라로 떠났어요.",
            name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::text_utils::count_self_choice_indicators;

    #[test]
    fn test_fallback_has_five_chapters() {
        let story = fallback_story("민수", "6", "남자");
        assert_eq!(story.chapters.len(), 5);
        assert!(story.title.contains("민수"));
        assert!(story.character.contains("6살 남자아이"));
        assert!(story
            .chapters
            .iter()
            .all(|c| !c.title.is_empty() && !c.paragraph.is_empty()));
    }

    #[test]
    fn test_fallback_passes_self_choice_check() {
        let story = fallback_story("지우", "5", "여자");
        let text: String = story.chapters.iter().map(|c| c.paragraph.as_str()).collect();
        assert!(count_self_choice_indicators(&text) > 0);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(fallback_story("하늘", "7", "x"), fallback_story("하늘", "7", "x"));
    }
}
