//! Built-in exercise library with form cues and demo videos

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Exercise {
  pub key: &'static str,
  pub name: &'static str,
  pub description: &'static str,
  pub youtube_id: &'static str,
}

const fn exercise(
  key: &'static str,
  name: &'static str,
  description: &'static str,
  youtube_id: &'static str,
) -> Exercise {
  Exercise {
    key,
    name,
    description,
    youtube_id,
  }
}

pub static EXERCISES: [Exercise; 12] = [
  exercise("pushup", "Push-up", "Keep a straight line from head to heels; lower chest near floor; elbows ~45°.", "I9fsqKE5XHo"),
  exercise("situp", "Sit-up", "Engage core to lift torso; avoid pulling with neck or lower back.", "pCX65Mtc_Kk"),
  exercise("squat", "Squat", "Hips back, knees track over toes (not far past); spine neutral.", "2t3Ab7a2ZM4"),
  exercise("bench", "Bench Press", "Stable chest/shoulders/elbows; bar path vertically down and up.", "hWbUlkb5Ms4"),
  exercise("deadlift", "Deadlift", "Flat back; coordinate knees and hips; bar travels close to legs.", "ZaTM37cfiDs"),
  exercise("plank", "Plank", "Body in a straight line; avoid hips too high or sagging.", "6LqqeBtFn9M"),
  exercise("pullup", "Pull-up", "Control the rhythm up and down; use assisted variations if needed.", "eGo4IYlbE5g"),
  exercise("lunges", "Lunges", "Front and back knee at safe angles; front knee not beyond toes.", "1LuRcKJMn8w"),
  exercise("burpee", "Burpee", "Combine squat, push-up, and jump in a smooth sequence.", "NCqbpkoiyXE"),
  exercise("climbers", "Mountain Climbers", "Fast and stable pace; use core to control body.", "cnyTQDSE884"),
  exercise("jumprope", "Jump Rope", "Use wrists to turn rope; light on toes with quick rebounds.", "wqN5bRkZPK0"),
  exercise("rowing", "Rowing Machine", "Drive sequence: legs → body → arms; recover in reverse order.", "ZN0J6qKCIrI"),
];

pub fn find(key: &str) -> Option<&'static Exercise> {
  EXERCISES.iter().find(|e| e.key == key)
}
