//! Built-in infrastructure support taxonomy.
//!
//! Ids match the categories provisioned in the helpdesk (`suportectl
//! categories provision`). Keywords are Portuguese stems, listed with and
//! without accents since callers often type without them.

use crate::taxonomy::CategoryDef;

pub fn builtin_categories() -> Vec<CategoryDef> {
    vec![
        CategoryDef::new(1, "Infraestrutura", &[]),
        // Backup
        CategoryDef::new(2, "Infraestrutura > Backup", &["backup|cópia de segurança|copia de seguranca"]),
        CategoryDef::new(3, "Infraestrutura > Backup > Agendamento", &["agend|programar|rotina"]),
        CategoryDef::new(4, "Infraestrutura > Backup > Falha de Backup", &["falh|fail|erro|não concluiu|nao concluiu"]),
        CategoryDef::new(5, "Infraestrutura > Backup > Restauração", &["restaur|recuperar"]),
        // Computadores
        CategoryDef::new(6, "Infraestrutura > Computadores", &["computador|desktop|notebook|laptop"]),
        CategoryDef::new(7, "Infraestrutura > Computadores > Desktops", &["desktop|gabinete"]),
        CategoryDef::new(8, "Infraestrutura > Computadores > Formatação/Reinstalação", &["format|reinstal"]),
        CategoryDef::new(9, "Infraestrutura > Computadores > Notebooks", &["notebook|laptop"]),
        CategoryDef::new(10, "Infraestrutura > Computadores > Upgrade/Manutenção", &["upgrade|manutenção|manutencao|memória|memoria|ssd"]),
        // Data Center
        CategoryDef::new(11, "Infraestrutura > Data Center", &["data center|datacenter|sala de servidores"]),
        CategoryDef::new(12, "Infraestrutura > Data Center > Climatização", &["ar-condicionado|ar condicionado|climatiza|temperatura"]),
        CategoryDef::new(13, "Infraestrutura > Data Center > Energia", &["energia|nobreak|queda de luz"]),
        CategoryDef::new(14, "Infraestrutura > Data Center > Racks", &["rack"]),
        // Firewall
        CategoryDef::new(15, "Infraestrutura > Firewall/Security", &["firewall|segurança|seguranca|bloque|sites|um site|o site|website"]),
        CategoryDef::new(16, "Infraestrutura > Firewall/Security > Bloqueio de Sites", &["sites|um site|o site|website|bloqueio de site"]),
        CategoryDef::new(17, "Infraestrutura > Firewall/Security > Regras de Acesso", &["regra|liberar|liberação|liberacao|porta tcp|porta udp|abrir porta|abrir a porta"]),
        // Impressoras
        CategoryDef::new(18, "Infraestrutura > Impressoras", &["impress|imprim|toner|tinta"]),
        CategoryDef::new(19, "Infraestrutura > Impressoras > Compartilhamento", &["compartilh"]),
        CategoryDef::new(20, "Infraestrutura > Impressoras > Configuração", &["configur|instalar"]),
        CategoryDef::new(21, "Infraestrutura > Impressoras > Erro Físico", &["papel|atolad|preso|quebr|barulho"]),
        CategoryDef::new(22, "Infraestrutura > Impressoras > Falta de Tinta/Toner", &["toner|tinta|cartucho"]),
        // Periféricos
        CategoryDef::new(23, "Infraestrutura > Periféricos", &["periférico|periferico|teclado|mouse|monitor|tela|scanner|webcam|headset"]),
        CategoryDef::new(24, "Infraestrutura > Periféricos > Monitor", &["monitor|tela"]),
        CategoryDef::new(25, "Infraestrutura > Periféricos > Outros", &["outro|scanner|webcam|headset|dúvida|duvida|preciso de|solicit|novo|nova"]),
        CategoryDef::new(26, "Infraestrutura > Periféricos > Outros > Dúvidas Gerais", &["dúvida|duvida|como usar"]),
        CategoryDef::new(27, "Infraestrutura > Periféricos > Outros > Solicitações Diversas", &["preciso de|solicit|novo|nova"]),
        CategoryDef::new(28, "Infraestrutura > Periféricos > Teclado/Mouse", &["teclado|mouse"]),
        // Rede
        CategoryDef::new(29, "Infraestrutura > Rede", &["da rede|de rede|na rede|sem rede|à rede|acessar a rede|rede cabeada|rede sem fio|internet|conex|conect|network|wi-fi|wifi|vpn|cabo"]),
        CategoryDef::new(30, "Infraestrutura > Rede > Cabeada", &["cabead|cabo|ethernet"]),
        CategoryDef::new(31, "Infraestrutura > Rede > Lentidão", &["lent|devagar|lag"]),
        CategoryDef::new(32, "Infraestrutura > Rede > Sem Conexão", &["sem conex|sem internet|sem rede|não consigo acessar|nao consigo acessar|caiu|offline"]),
        CategoryDef::new(33, "Infraestrutura > Rede > VPN", &["vpn"]),
        CategoryDef::new(34, "Infraestrutura > Rede > Wi-Fi", &["wi-fi|wifi|wireless|sem fio"]),
        // Servidores
        CategoryDef::new(35, "Infraestrutura > Servidores", &["servidor|server|virtual|vmware|hyper-v"]),
        CategoryDef::new(36, "Infraestrutura > Servidores > Backup de Servidor", &["backup"]),
        CategoryDef::new(37, "Infraestrutura > Servidores > Linux", &["linux|ubuntu|debian|red hat"]),
        CategoryDef::new(38, "Infraestrutura > Servidores > Virtualização", &["virtual|vmware|hyper-v"]),
        CategoryDef::new(39, "Infraestrutura > Servidores > Windows", &["windows"]),
        // Software de Infraestrutura
        CategoryDef::new(40, "Infraestrutura > Software de Infraestrutura", &["software|programa|licen|antivírus|antivirus|monitoramento"]),
        CategoryDef::new(41, "Infraestrutura > Software de Infraestrutura > Antivírus", &["antivírus|antivirus|vírus|virus|malware"]),
        CategoryDef::new(42, "Infraestrutura > Software de Infraestrutura > Ferramentas de Monitoramento", &["monitoramento|zabbix|nagios|grafana"]),
        CategoryDef::new(43, "Infraestrutura > Software de Infraestrutura > Licenciamento", &["licen"]),
        // Telefonia
        CategoryDef::new(44, "Infraestrutura > Telefonia", &["telefon|ramal|pabx|voip"]),
        CategoryDef::new(45, "Infraestrutura > Telefonia > Convencional", &["fixo|convencional|analógic|analogic|linha"]),
        CategoryDef::new(46, "Infraestrutura > Telefonia > IP", &["telefone ip|telefonia ip|voip|sip"]),
        CategoryDef::new(47, "Infraestrutura > Telefonia > PABX", &["pabx|central telefônica|central telefonica"]),
    ]
}
