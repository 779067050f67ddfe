use crate::gallery::{EntryKind, GalleryEntry};

const NAV: &str = "<nav>\
<a href=\"/\">Home</a> <a href=\"/video-creator\">Video Creator</a> \
<a href=\"/image-creator\">Image Creator</a> <a href=\"/gallery/photos\">Photos</a> \
<a href=\"/gallery/videos\">Videos</a> <a href=\"/pricing\">Pricing</a> \
<a href=\"/about\">About</a> <a href=\"/contact\">Contact</a></nav>";

fn shell(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title} - StoryReel</title>\
<style>body{{font-family:sans-serif;max-width:60rem;margin:2rem auto;padding:0 1rem}}\
nav a{{margin-right:.8rem}}textarea{{width:100%;height:6rem}}\
.card{{border:1px solid #ccc;border-radius:6px;padding:1rem;margin:1rem 0}}\
.card img,.card video{{max-width:100%}}</style></head>\
<body>{NAV}<h1>{title}</h1>{body}</body></html>"
    )
}

pub fn home() -> String {
    shell(
        "StoryReel",
        "<p>Turn a short prompt into an AI-generated image, or a whole story \
into a narrated slideshow video.</p>\
<p><a href=\"/video-creator\">Create a video</a> or \
<a href=\"/image-creator\">create an image</a>.</p>",
    )
}

pub fn video_creator() -> String {
    shell(
        "Video Creator",
        "<form id=\"f\"><textarea name=\"prompt\" placeholder=\"Write a short story. Each sentence becomes a scene.\"></textarea>\
<p><label>Voice <select name=\"voice\" id=\"voice\"><option value=\"hi-IN-SwaraNeural\">hi-IN-SwaraNeural</option></select></label></p>\
<button>Generate Video</button></form><div id=\"out\"></div>\
<script>\
fetch('/voices').then(r=>r.json()).then(vs=>{const s=document.getElementById('voice');s.innerHTML='';\
vs.forEach(v=>{const o=document.createElement('option');o.value=v.ShortName;o.textContent=v.ShortName;s.append(o)})}).catch(()=>{});\
document.getElementById('f').addEventListener('submit',async e=>{e.preventDefault();\
const out=document.getElementById('out');out.textContent='Generating, this can take a few minutes...';\
const r=await fetch('/generate-video',{method:'POST',body:new URLSearchParams(new FormData(e.target))});\
const j=await r.json();\
out.innerHTML=j.video_url?`<video controls src=\"${j.video_url}\"></video>`:`<p>${j.error}</p>`;});\
</script>",
    )
}

pub fn image_creator() -> String {
    shell(
        "Image Creator",
        "<form id=\"f\"><textarea name=\"prompt\" placeholder=\"Describe the image you want.\"></textarea>\
<button>Generate Image</button></form><div id=\"out\"></div>\
<script>\
document.getElementById('f').addEventListener('submit',async e=>{e.preventDefault();\
const out=document.getElementById('out');out.textContent='Generating...';\
const r=await fetch('/generate-image',{method:'POST',body:new URLSearchParams(new FormData(e.target))});\
const j=await r.json();\
out.innerHTML=j.image_url?`<img src=\"${j.image_url}\">`:`<p>${j.error}</p>`;});\
</script>",
    )
}

pub fn pricing() -> String {
    shell(
        "Pricing",
        "<p>Free while in beta. Generated media stays on this server.</p>",
    )
}

pub fn about() -> String {
    shell(
        "About",
        "<p>StoryReel stitches AI-generated images and synthesized narration \
into short slideshow videos.</p>",
    )
}

pub fn contact() -> String {
    shell("Contact", "<p>Say hello at hello@storyreel.example.</p>")
}

pub fn gallery(title: &str, entries: &[GalleryEntry]) -> String {
    let mut body = String::new();
    if entries.is_empty() {
        body.push_str("<p>Nothing published yet.</p>");
    }
    for entry in entries {
        let media = match entry.kind {
            EntryKind::Photo => format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape_html(&entry.file_url),
                escape_html(&entry.title)
            ),
            EntryKind::Video => format!(
                "<video controls src=\"{}\"></video>",
                escape_html(&entry.file_url)
            ),
        };
        body.push_str(&format!(
            "<div class=\"card\">{media}<h3>{}</h3><p>{}</p>\
<p><small>{} &middot; {}</small></p></div>",
            escape_html(&entry.title),
            escape_html(&entry.description),
            escape_html(&entry.tags),
            escape_html(&entry.timestamp),
        ));
    }
    shell(title, &body)
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>\"x\" & y</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; y&lt;/script&gt;"
        );
    }

    #[test]
    fn test_gallery_escapes_entries() {
        let entry = GalleryEntry {
            id: "e1".to_string(),
            kind: EntryKind::Photo,
            title: "<b>bold</b>".to_string(),
            description: "desc".to_string(),
            tags: "t".to_string(),
            file_url: "/static/images/x.png".to_string(),
            timestamp: "2026-08-05 12:00".to_string(),
        };
        let html = gallery("Photos", &[entry]);
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!html.contains("<b>bold</b>"));
    }
}
