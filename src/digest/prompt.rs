use crate::digest::content::LogContent;

pub const MAX_TOPICS: usize = 5;
pub const TOPIC_DELIMITER: &str = "------------";
/// Markdown hard break closing each instruction line.
const BR: &str = "  ";

/// Render the daily-report instruction for one group.
///
/// The output depends only on the arguments, so identical inputs always
/// produce identical prompts.
pub fn build_prompt(group: &str, date: &str, content: &LogContent) -> String {
    let body = content.render();
    format!(
        "talker：{group}
Time：{date}

请帮我将 \"{group}\" 在\"{date}\" 的群聊内容总结成一个群聊报告，包含不多于{MAX_TOPICS}个的话题的总结（如果还有更多话题，可以在后面简单补充）。每个话题包含以下内容：{BR}
- 话题名（50字以内，带序号1️⃣2️⃣3️⃣，同时附带热度，以🔥数量表示）{BR}
- 参与者（不超过5个人，将重复的人名去重）{BR}
- 时间段（从几点到几点）{BR}
- 过程（50到200字左右）{BR}
- 评价（50字以下）{BR}
- 分割线： {TOPIC_DELIMITER}{BR}

另外有以下要求：{BR}
1. 每个话题结束使用 {TOPIC_DELIMITER} 分割{BR}
2. 使用中文冒号{BR}
3. 无需大标题{BR}
4. 开始给出本群讨论风格的整体评价，例如活跃、太水、太黄、太暴力、话题不集中、无聊诸如此类

群聊内容：
{body}"
    )
}
