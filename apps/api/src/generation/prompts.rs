// Prompts for the editor's "generate" buttons. Both ask for bare JSON.

const WORK_SUMMARY_PROMPT: &str = "\
You are an expert resume writer. Turn the input below into professional, \
achievement-oriented bullet points for one work experience entry.

INPUT:
- Position Title: \"{position_title}\"
- Company Name: \"{company_name}\"
- Work Summary (user description): \"{work_summary}\"

Requirements:
1. Respond ONLY with one JSON object, no markdown fences and no commentary.
2. The object has two fields:
   \"positionTitle\": string, echoing the input position title.
   \"experience\": array of 4 to 5 strings.
3. Each string is one concise, action-oriented bullet wrapped in <li> and </li>, \
grounded in the user's description and the title and company above.";

const SUMMARY_PROMPT: &str = "\
Job Title: {job_title}. Based on this job title, write a professional resume summary \
for each of three experience levels: Senior, Mid Level and Fresher. Each summary is 3 to 4 lines. \
Respond ONLY with a JSON array of objects with the fields \"experience_level\" and \"summary\".";

pub fn work_summary_prompt(position_title: &str, company_name: &str, work_summary: &str) -> String {
    WORK_SUMMARY_PROMPT
        .replace("{position_title}", position_title)
        .replace("{company_name}", company_name)
        .replace("{work_summary}", work_summary)
}

pub fn summary_prompt(job_title: &str) -> String {
    SUMMARY_PROMPT.replace("{job_title}", job_title)
}
