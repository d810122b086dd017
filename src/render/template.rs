//! Static parts of the archived document: stylesheet and navigation script.

use std::fmt::Write;

/// Border colors of the ten depth bands, indexed by `depth % 10`
pub const BAND_COLORS: [&str; 10] = [
    "#fd79a8", "#3867d6", "#e74c3c", "#20bf6b", "#f7b731", "#9b59b6", "#fa8231", "#a5b1c2",
    "#4b6584", "#0fb9b1",
];

const BASE_STYLE: &str = concat!(
    "html{font-family:'Arial','Helvetica',sans-serif;font-size:15px;box-sizing:border-box;}",
    "article,section{display:block;margin:0 -5px 0 0;padding:5px;}",
    "header{font-weight:bold;}",
    ".f{margin-top:15px;}",
    ".o{background-color:#eaeaea;}",
    ".e{background-color:#fafafa;}",
    ".m{background-color:#c8ffc8;}",
    ".a{background-color:#ffdcd2;}",
    ".p{background-color:#b4c8ff;}",
    ".n{text-decoration:none;}",
    ".D{cursor:not-allowed!important;color:#ccc!important;}",
);

/// Full inline stylesheet, band rules included
pub fn stylesheet() -> String {
    let mut css = String::from(BASE_STYLE);
    for (band, color) in BAND_COLORS.iter().enumerate() {
        let _ = write!(
            css,
            ".l{band}{{border-left:4px solid {color};}}\
             .l{band} > header,.l{band} > header a{{color:{color};}}"
        );
    }
    css
}

/// Keyboard traversal: up/down follow the sibling anchors, left or `p` the parent anchor
pub const NAVIGATION_SCRIPT: &str = r##"<script>
function currentNode(){var id=window.location.hash.substr(1);return id?document.getElementById(id):null}
function jump(id){var t=document.getElementById(id);if(t){t.scrollIntoView(true);window.location.hash=id}}
function follow(cls){var n=currentNode();if(!n)return;var link=n.querySelector(":scope > header > a."+cls);if(!link||link.classList.contains("D"))return;jump(link.getAttribute("href").substr(1))}
document.onkeydown=function(e){e=e||window.event;
if(e.keyCode==38){e.preventDefault();follow("A")}
else if(e.keyCode==40){e.preventDefault();follow("B")}
else if(e.keyCode==37||e.keyCode==80){follow("P")}};
</script>"##;
